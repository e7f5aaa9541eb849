use std::fmt;

use onboard_core::{DeviceCredential, RendezvousBlob};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoChangeReason {
    /// Rendezvous-only session; carries the blob when a round succeeded.
    RendezvousOnly { rendezvous: Option<RendezvousBlob> },
    AlreadyOnboarded,
}

/// Exhaustion outcomes. The stored credential stays valid and unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OnboardingFailure {
    NoTransferCandidates {
        rendezvous: Option<RendezvousBlob>,
    },
    TransferExhausted {
        attempts: usize,
        rendezvous: Option<RendezvousBlob>,
    },
}

impl fmt::Display for OnboardingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTransferCandidates { .. } => f.write_str("no transfer candidates available"),
            Self::TransferExhausted { attempts, .. } => {
                write!(f, "all {attempts} transfer candidates failed")
            }
        }
    }
}

/// Terminal result of one onboarding invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OnboardingOutcome {
    CredentialUpdated {
        credential: DeviceCredential,
        owner_url: Url,
    },
    NoChange(NoChangeReason),
    Failed(OnboardingFailure),
}

impl OnboardingOutcome {
    pub fn updated_credential(&self) -> Option<&DeviceCredential> {
        match self {
            Self::CredentialUpdated { credential, .. } => Some(credential),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
