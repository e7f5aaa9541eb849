use std::{fs::File, io::Read, sync::Arc};

use onboard_vfs::VirtualFs;
use sha2::{Digest, Sha384};

use crate::module_error::ModuleError;

pub const UPLOAD_MODULE_NAME: &str = "fdo.upload";

/// Bytes and digest of a file served to the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub contents: Vec<u8>,
    pub sha384: Vec<u8>,
}

/// Serves owner upload requests from the session's virtual filesystem.
#[derive(Debug, Clone)]
pub struct UploadModule {
    vfs: Arc<VirtualFs>,
}

impl UploadModule {
    pub fn new(vfs: Arc<VirtualFs>) -> Self {
        Self { vfs }
    }

    pub fn vfs(&self) -> &VirtualFs {
        &self.vfs
    }

    pub fn open(&self, name: &str) -> Result<File, ModuleError> {
        Ok(self.vfs.open(name)?)
    }

    pub fn read(&self, name: &str) -> Result<UploadPayload, ModuleError> {
        let mut file = self.open(name)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|error| ModuleError::io("failed to read upload", name, error))?;
        let sha384 = Sha384::digest(&contents).to_vec();
        tracing::debug!(name, bytes = contents.len(), "upload served");
        Ok(UploadPayload { contents, sha384 })
    }
}
