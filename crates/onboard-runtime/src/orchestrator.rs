use std::sync::Arc;

use onboard_capabilities::CapabilityAssembler;
use onboard_core::{CancellationToken, LoadedCredential, OnboardError, SessionConfig};

use crate::{
    address_resolver::HostResolver,
    outcome::{NoChangeReason, OnboardingFailure, OnboardingOutcome},
    protocol::{OnboardingProtocol, TransportFactory},
    rendezvous_walker::{random_jitter_source, JitterFn, RendezvousStatus, RendezvousWalker},
    transfer_walker::{transfer_candidates, TransferStatus, TransferWalker},
};

/// Runs one onboarding attempt end to end.
///
/// Holds the immutable session plus the collaborators; `run` may be called
/// with any loaded credential and a cancellation token scoped to the call.
pub struct Orchestrator {
    session: SessionConfig,
    protocol: Arc<dyn OnboardingProtocol>,
    transports: Arc<dyn TransportFactory>,
    resolver: Arc<dyn HostResolver>,
    assembler: CapabilityAssembler,
    jitter: Option<JitterFn>,
}

impl Orchestrator {
    pub fn new(
        session: SessionConfig,
        protocol: Arc<dyn OnboardingProtocol>,
        transports: Arc<dyn TransportFactory>,
        resolver: Arc<dyn HostResolver>,
    ) -> Result<Self, OnboardError> {
        let assembler = CapabilityAssembler::new(&session)
            .map_err(|error| OnboardError::InvalidConfig(error.to_string()))?;
        Ok(Self::with_assembler(
            session, protocol, transports, resolver, assembler,
        ))
    }

    /// Uses a prebuilt assembler (for example one carrying a custom upload mapping).
    pub fn with_assembler(
        session: SessionConfig,
        protocol: Arc<dyn OnboardingProtocol>,
        transports: Arc<dyn TransportFactory>,
        resolver: Arc<dyn HostResolver>,
        assembler: CapabilityAssembler,
    ) -> Self {
        let jitter = session.delay_jitter.then(random_jitter_source);
        Self {
            session,
            protocol,
            transports,
            resolver,
            assembler,
            jitter,
        }
    }

    /// Replaces the jitter sample source; `None` disables jitter.
    pub fn with_jitter_source(mut self, jitter: Option<JitterFn>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub async fn run(
        &self,
        loaded: &LoadedCredential,
        cancel: &CancellationToken,
    ) -> Result<OnboardingOutcome, OnboardError> {
        let walk = RendezvousWalker::new(
            self.protocol.as_ref(),
            self.transports.as_ref(),
            self.session.insecure_tls,
        )
        .with_jitter(self.jitter.clone())
        .walk(
            &loaded.credential.rendezvous,
            &loaded.credential,
            &loaded.keys,
            cancel,
        )
        .await;

        match &walk.status {
            RendezvousStatus::Cancelled => return Err(OnboardError::Cancelled),
            RendezvousStatus::Exhausted { attempts } => {
                tracing::warn!(attempts, "no rendezvous server produced a redirection blob");
            }
            RendezvousStatus::NotAttempted | RendezvousStatus::Redirected { .. } => {}
        }

        if self.session.rendezvous_only {
            if let Some(blob) = walk.blob() {
                tracing::info!(blob = %blob, "rendezvous-only session complete");
            }
            return Ok(OnboardingOutcome::NoChange(NoChangeReason::RendezvousOnly {
                rendezvous: walk.into_blob(),
            }));
        }

        let rendezvous = walk.blob();
        let candidates = transfer_candidates(
            walk.bypass_urls.clone(),
            rendezvous,
            self.resolver.as_ref(),
        );
        let status = TransferWalker::new(
            self.protocol.as_ref(),
            self.transports.as_ref(),
            &self.assembler,
            &self.session,
        )
        .walk(candidates, rendezvous, loaded, cancel)
        .await;

        match status {
            TransferStatus::Cancelled => Err(OnboardError::Cancelled),
            TransferStatus::Updated {
                credential,
                owner_url,
            } => {
                tracing::info!(owner_url = %owner_url, "transfer produced a new credential");
                Ok(OnboardingOutcome::CredentialUpdated {
                    credential,
                    owner_url,
                })
            }
            TransferStatus::Exhausted { attempts: 0 } => Ok(OnboardingOutcome::Failed(
                OnboardingFailure::NoTransferCandidates {
                    rendezvous: rendezvous.cloned(),
                },
            )),
            TransferStatus::Exhausted { attempts } => Ok(OnboardingOutcome::Failed(
                OnboardingFailure::TransferExhausted {
                    attempts,
                    rendezvous: rendezvous.cloned(),
                },
            )),
        }
    }
}
