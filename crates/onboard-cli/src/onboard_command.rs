use std::{io::Write, sync::Arc};

use anyhow::{Context, Result};
use onboard_core::{
    CancellationToken, CredentialStore, DeviceState, OnboardError, OnboardingPlan,
};
use onboard_runtime::{
    HostResolver, NoChangeReason, OnboardingOutcome, OnboardingProtocol, Orchestrator,
    TransportFactory,
};

use crate::{
    onboard_args::OnboardArgs, tracing_init::init_tracing, validation::validate_onboard_args,
};

pub const ONBOARD_COMPLETE_MESSAGE: &str = "FIDO Device Onboard Complete";
pub const ALREADY_ONBOARDED_MESSAGE: &str =
    "FDO in Idle State. Device Onboarding already completed";
pub const CREDENTIAL_NOT_UPDATED_MESSAGE: &str =
    "Credential not updated (either due to failure of transfer or the credential reuse protocol)";

/// External collaborators the command runs against.
pub struct OnboardCollaborators<'a> {
    pub store: &'a dyn CredentialStore,
    pub protocol: Arc<dyn OnboardingProtocol>,
    pub transports: Arc<dyn TransportFactory>,
    pub resolver: Arc<dyn HostResolver>,
}

/// Entry point for an `onboard` executable: installs tracing at the level
/// `--debug` selects, then reports to stdout.
pub async fn run_onboard_cli(
    args: &OnboardArgs,
    collaborators: OnboardCollaborators<'_>,
    cancel: &CancellationToken,
) -> Result<OnboardingOutcome> {
    init_tracing(args.debug);
    let mut stdout = std::io::stdout();
    run_onboard_command(args, collaborators, cancel, &mut stdout).await
}

/// Runs the `onboard` command and writes the user-facing report to `out`.
///
/// A new credential is saved with state `Idle` only after the transfer phase
/// produced one; every other outcome leaves the store untouched.
pub async fn run_onboard_command(
    args: &OnboardArgs,
    collaborators: OnboardCollaborators<'_>,
    cancel: &CancellationToken,
    out: &mut dyn Write,
) -> Result<OnboardingOutcome> {
    let validated = validate_onboard_args(args).context("validation error")?;
    let store = collaborators.store;

    let state = store.device_state().context("load device status failed")?;
    tracing::debug!(state = %state, "{}", state.describe());

    let outcome = match OnboardingPlan::decide(state, validated.session.resale)? {
        OnboardingPlan::AlreadyOnboarded => {
            OnboardingOutcome::NoChange(NoChangeReason::AlreadyOnboarded)
        }
        OnboardingPlan::Onboard => {
            let loaded = store.load().context("failed to load device credential")?;
            let actual = loaded.keys.signer.key_type();
            if actual != validated.key_type {
                return Err(OnboardError::KeyTypeMismatch {
                    expected: validated.key_type,
                    actual,
                })
                .context("failed to load device credential");
            }
            tracing::debug!(key_type = actual.as_str(), "device credential loaded");
            let orchestrator = Orchestrator::new(
                validated.session,
                collaborators.protocol,
                collaborators.transports,
                collaborators.resolver,
            )?;
            let outcome = orchestrator
                .run(&loaded, cancel)
                .await
                .context("onboarding aborted")?;
            if let Some(credential) = outcome.updated_credential() {
                store
                    .save(credential, DeviceState::Idle)
                    .context("failed to store new device credential")?;
            }
            outcome
        }
    };

    report_outcome(&outcome, validated.json, out)?;
    Ok(outcome)
}

fn report_outcome(outcome: &OnboardingOutcome, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, outcome).context("failed to encode outcome")?;
        writeln!(out)?;
        return Ok(());
    }
    match outcome {
        OnboardingOutcome::CredentialUpdated { .. } => writeln!(out, "{ONBOARD_COMPLETE_MESSAGE}")?,
        OnboardingOutcome::NoChange(NoChangeReason::AlreadyOnboarded) => {
            writeln!(out, "{ALREADY_ONBOARDED_MESSAGE}")?
        }
        OnboardingOutcome::NoChange(NoChangeReason::RendezvousOnly { rendezvous }) => {
            if let Some(blob) = rendezvous {
                writeln!(out, "Rendezvous blob: {blob}")?;
            }
        }
        OnboardingOutcome::Failed(failure) => {
            tracing::warn!(reason = %failure, "onboarding did not update the credential");
            writeln!(out, "{CREDENTIAL_NOT_UPDATED_MESSAGE}")?
        }
    }
    Ok(())
}
