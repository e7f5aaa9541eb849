use thiserror::Error;

use crate::{device_keys::DeviceKeyType, device_state::DeviceState};

/// Invocation-level failures of an onboarding attempt.
///
/// Per-candidate failures never surface here; they are logged and the walk
/// moves on. Exhaustion is reported through the outcome, not as an error.
#[derive(Debug, Error)]
pub enum OnboardError {
    #[error("invalid cipher suite: {0}")]
    UnknownCipherSuite(String),
    #[error("invalid key exchange suite: '{name}', options [{options}]")]
    UnknownKexSuite { name: String, options: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("device has not been properly initialized: run device-init first")]
    DeviceNotInitialized,
    #[error("device state is invalid: {0}")]
    InvalidDeviceState(DeviceState),
    #[error(
        "device key type mismatch: credential holds {}, requested {}",
        .actual.as_str(),
        .expected.as_str()
    )]
    KeyTypeMismatch {
        expected: DeviceKeyType,
        actual: DeviceKeyType,
    },
    #[error("onboarding cancelled")]
    Cancelled,
    #[error("credential store error: {0}")]
    Store(#[from] crate::credential_store::StoreError),
}
