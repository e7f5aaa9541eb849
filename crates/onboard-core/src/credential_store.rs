//! Credential-store seam.
//!
//! The at-rest format and key handling belong to the store implementation;
//! the orchestrator only needs load, save, and the device lifecycle state.

use std::fmt;

use thiserror::Error;

use crate::{device_keys::DeviceKeys, device_state::DeviceState, types::DeviceCredential};

/// Failures reported by a credential store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read device state: {0}")]
    State(String),
    #[error("failed to load device credential: {0}")]
    Load(String),
    #[error("failed to save device credential: {0}")]
    Save(String),
}

type CleanupFn = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// Credential plus key material; runs the backend's cleanup action on drop.
pub struct LoadedCredential {
    pub credential: DeviceCredential,
    pub keys: DeviceKeys,
    cleanup: Option<CleanupFn>,
}

impl LoadedCredential {
    pub fn new(credential: DeviceCredential, keys: DeviceKeys) -> Self {
        Self {
            credential,
            keys,
            cleanup: None,
        }
    }

    /// Registers an action (for example closing a TPM session) run exactly once.
    pub fn with_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

impl fmt::Debug for LoadedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedCredential")
            .field("credential", &self.credential)
            .field("keys", &self.keys)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

impl Drop for LoadedCredential {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            if let Err(error) = cleanup() {
                tracing::warn!(error = %error, "credential cleanup failed");
            }
        }
    }
}

/// Storage backend for the device credential and lifecycle state.
pub trait CredentialStore {
    fn device_state(&self) -> Result<DeviceState, StoreError>;

    fn load(&self) -> Result<LoadedCredential, StoreError>;

    fn save(&self, credential: &DeviceCredential, state: DeviceState) -> Result<(), StoreError>;
}
