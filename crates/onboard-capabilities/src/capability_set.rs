use std::{collections::BTreeMap, sync::Arc};

use onboard_core::{DeviceInfo, SessionConfig, COMMAND_ECHO_TIMEOUT, REMOTE_FETCH_TIMEOUT};
use onboard_vfs::{VfsError, VirtualFs};

use crate::{
    command_module::{CommandModule, COMMAND_MODULE_NAME},
    download_module::{DownloadModule, DOWNLOAD_MODULE_NAME},
    upload_module::{UploadModule, UPLOAD_MODULE_NAME},
    wget_module::{WgetModule, WGET_MODULE_NAME},
};

pub const INTEROP_MODULE_NAME: &str = "fido_alliance";

/// Interop probe; always offered, reports the device description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropModule {
    device_info: DeviceInfo,
}

impl InteropModule {
    pub fn new(device_info: DeviceInfo) -> Self {
        Self { device_info }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }
}

#[derive(Debug, Clone)]
pub enum DeviceModule {
    Interop(InteropModule),
    Download(DownloadModule),
    Command(CommandModule),
    Upload(UploadModule),
    Wget(WgetModule),
}

impl DeviceModule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Interop(_) => INTEROP_MODULE_NAME,
            Self::Download(_) => DOWNLOAD_MODULE_NAME,
            Self::Command(_) => COMMAND_MODULE_NAME,
            Self::Upload(_) => UPLOAD_MODULE_NAME,
            Self::Wget(_) => WGET_MODULE_NAME,
        }
    }
}

/// Service-info modules offered during one transfer attempt, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    modules: BTreeMap<&'static str, DeviceModule>,
}

impl CapabilitySet {
    fn insert(&mut self, module: DeviceModule) {
        self.modules.insert(module.name(), module);
    }

    pub fn get(&self, name: &str) -> Option<&DeviceModule> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn interop(&self) -> Option<&InteropModule> {
        match self.get(INTEROP_MODULE_NAME) {
            Some(DeviceModule::Interop(module)) => Some(module),
            _ => None,
        }
    }

    pub fn download(&self) -> Option<&DownloadModule> {
        match self.get(DOWNLOAD_MODULE_NAME) {
            Some(DeviceModule::Download(module)) => Some(module),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&CommandModule> {
        match self.get(COMMAND_MODULE_NAME) {
            Some(DeviceModule::Command(module)) => Some(module),
            _ => None,
        }
    }

    pub fn upload(&self) -> Option<&UploadModule> {
        match self.get(UPLOAD_MODULE_NAME) {
            Some(DeviceModule::Upload(module)) => Some(module),
            _ => None,
        }
    }

    pub fn wget(&self) -> Option<&WgetModule> {
        match self.get(WGET_MODULE_NAME) {
            Some(DeviceModule::Wget(module)) => Some(module),
            _ => None,
        }
    }
}

/// Builds the module set for one attempt from session flags.
///
/// The upload module is offered only when a virtual filesystem is supplied
/// and the session names upload paths.
pub fn assemble_capabilities(config: &SessionConfig, vfs: Option<&Arc<VirtualFs>>) -> CapabilitySet {
    let mut set = CapabilitySet::default();
    set.insert(DeviceModule::Interop(InteropModule::new(
        config.device_info.clone(),
    )));
    if config.download_enabled() {
        if let Some(dir) = &config.download_dir {
            set.insert(DeviceModule::Download(DownloadModule::new(dir)));
        }
    }
    if config.echo_commands {
        set.insert(DeviceModule::Command(CommandModule::new(COMMAND_ECHO_TIMEOUT)));
    }
    if config.upload_enabled() {
        if let Some(vfs) = vfs {
            set.insert(DeviceModule::Upload(UploadModule::new(Arc::clone(vfs))));
        }
    }
    if config.wget_enabled() {
        if let Some(dir) = &config.wget_dir {
            set.insert(DeviceModule::Wget(WgetModule::new(dir, REMOTE_FETCH_TIMEOUT)));
        }
    }
    set
}

/// Produces a fresh [`CapabilitySet`] per transfer attempt.
///
/// The upload mapping is derived from the session once and shared read-only
/// between attempts.
#[derive(Debug, Clone)]
pub struct CapabilityAssembler {
    config: SessionConfig,
    vfs: Option<Arc<VirtualFs>>,
}

impl CapabilityAssembler {
    pub fn new(config: &SessionConfig) -> Result<Self, VfsError> {
        let vfs = if config.upload_enabled() {
            let vfs = VirtualFs::from_upload_paths(&config.upload_paths)?;
            tracing::debug!(upload_set = %vfs, "upload mapping prepared");
            Some(Arc::new(vfs))
        } else {
            None
        };
        Ok(Self {
            config: config.clone(),
            vfs,
        })
    }

    pub fn with_vfs(config: &SessionConfig, vfs: VirtualFs) -> Self {
        Self {
            config: config.clone(),
            vfs: Some(Arc::new(vfs)),
        }
    }

    pub fn vfs(&self) -> Option<&VirtualFs> {
        self.vfs.as_deref()
    }

    pub fn assemble(&self) -> CapabilitySet {
        assemble_capabilities(&self.config, self.vfs.as_ref())
    }
}
