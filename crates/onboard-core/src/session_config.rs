use std::{path::PathBuf, time::Duration};

use crate::{
    suites::{CipherSuite, KexSuite},
    types::DeviceInfo,
};

/// Timeout applied by the command-echo module.
pub const COMMAND_ECHO_TIMEOUT: Duration = Duration::from_secs(1);
/// Timeout applied by the remote-fetch module.
pub const REMOTE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest fraction a rendezvous delay may be stretched or shortened by.
pub const MAX_DELAY_JITTER_FRACTION: f64 = 0.25;

/// Immutable configuration for one onboarding invocation.
///
/// Built once from validated flags and shared read-only by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub cipher_suite: CipherSuite,
    pub kex_suite: KexSuite,
    pub rendezvous_only: bool,
    pub resale: bool,
    pub insecure_tls: bool,
    pub download_dir: Option<PathBuf>,
    pub echo_commands: bool,
    pub upload_paths: Vec<PathBuf>,
    pub wget_dir: Option<PathBuf>,
    pub device_info: DeviceInfo,
    /// Applies up to +/-25% jitter to rendezvous delays when set.
    pub delay_jitter: bool,
}

impl SessionConfig {
    pub fn new(cipher_suite: CipherSuite, kex_suite: KexSuite) -> Self {
        Self {
            cipher_suite,
            kex_suite,
            rendezvous_only: false,
            resale: false,
            insecure_tls: false,
            download_dir: None,
            echo_commands: false,
            upload_paths: Vec::new(),
            wget_dir: None,
            device_info: DeviceInfo::current(),
            delay_jitter: false,
        }
    }

    pub fn download_enabled(&self) -> bool {
        self.download_dir
            .as_ref()
            .is_some_and(|dir| !dir.as_os_str().is_empty())
    }

    pub fn upload_enabled(&self) -> bool {
        !self.upload_paths.is_empty()
    }

    pub fn wget_enabled(&self) -> bool {
        self.wget_dir
            .as_ref()
            .is_some_and(|dir| !dir.as_os_str().is_empty())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(CipherSuite::A128Gcm, KexSuite::Ecdh256)
    }
}
