use futures_util::{stream, Stream, StreamExt};
use onboard_capabilities::CapabilityAssembler;
use onboard_core::{
    CancellationToken, DeviceCredential, LoadedCredential, RendezvousBlob, SessionConfig,
};
use url::Url;

use crate::{
    address_resolver::{resolve_transfer_address, HostResolver},
    protocol::{OnboardingProtocol, TransferConfig, TransportFactory},
};

/// Lazily yields transfer candidates: bypass URLs first, then the owner
/// addresses of the blob, each resolved only when the walk reaches it.
pub fn transfer_candidates<'a>(
    bypass_urls: Vec<Url>,
    rendezvous: Option<&'a RendezvousBlob>,
    resolver: &'a dyn HostResolver,
) -> impl Stream<Item = Url> + 'a {
    let owner_addresses = rendezvous
        .map(|blob| blob.owner_addresses.as_slice())
        .unwrap_or_default();
    let owners = stream::iter(owner_addresses)
        .then(move |address| resolve_transfer_address(address, resolver))
        .flat_map(stream::iter);
    stream::iter(bypass_urls).chain(owners)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Updated {
        credential: DeviceCredential,
        owner_url: Url,
    },
    Exhausted {
        attempts: usize,
    },
    Cancelled,
}

/// Attempts the transfer phase once per candidate until one yields a credential.
pub struct TransferWalker<'a> {
    protocol: &'a dyn OnboardingProtocol,
    transports: &'a dyn TransportFactory,
    assembler: &'a CapabilityAssembler,
    session: &'a SessionConfig,
}

impl<'a> TransferWalker<'a> {
    pub fn new(
        protocol: &'a dyn OnboardingProtocol,
        transports: &'a dyn TransportFactory,
        assembler: &'a CapabilityAssembler,
        session: &'a SessionConfig,
    ) -> Self {
        Self {
            protocol,
            transports,
            assembler,
            session,
        }
    }

    pub async fn walk<S>(
        &self,
        candidates: S,
        rendezvous: Option<&RendezvousBlob>,
        loaded: &LoadedCredential,
        cancel: &CancellationToken,
    ) -> TransferStatus
    where
        S: Stream<Item = Url>,
    {
        let mut candidates = std::pin::pin!(candidates);
        let mut attempts = 0usize;
        loop {
            if cancel.is_cancelled() {
                return TransferStatus::Cancelled;
            }
            let Some(url) = (match cancel.run_until_cancelled(candidates.next()).await {
                Some(next) => next,
                None => return TransferStatus::Cancelled,
            }) else {
                break;
            };
            attempts += 1;

            let transport = match self.transports.connect(&url, self.session.insecure_tls) {
                Ok(transport) => transport,
                Err(error) => {
                    tracing::error!(base_url = %url, error = %error, "transfer transport failed");
                    continue;
                }
            };
            let config = TransferConfig::new(
                self.session,
                &loaded.credential,
                &loaded.keys,
                self.assembler.assemble(),
            );
            tracing::info!(base_url = %url, modules = ?config.capabilities.names(), "transfer attempt started");
            let attempt = self.protocol.transfer(transport.as_ref(), rendezvous, config);
            match cancel.run_until_cancelled(attempt).await {
                None => return TransferStatus::Cancelled,
                Some(Ok(Some(credential))) => {
                    return TransferStatus::Updated {
                        credential,
                        owner_url: url,
                    }
                }
                Some(Ok(None)) => {
                    tracing::warn!(base_url = %url, "transfer completed without a new credential");
                }
                Some(Err(error)) => {
                    tracing::error!(base_url = %url, error = %error, "transfer failed");
                }
            }
        }

        if attempts > 0 {
            tracing::warn!(attempts, "transfer candidates exhausted");
        }
        TransferStatus::Exhausted { attempts }
    }
}
