use std::path::{Path, PathBuf};

use crate::{module_error::ModuleError, path_containment::contain_name, staged_file::StagedFile};

pub const DOWNLOAD_MODULE_NAME: &str = "fdo.download";
const DOWNLOAD_TEMP_PREFIX: &str = ".fdo.download_";

/// Receives owner-pushed files into the configured download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadModule {
    dir: PathBuf,
}

impl DownloadModule {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final location for an owner-supplied name, always inside the directory.
    pub fn name_to_path(&self, name: &str) -> Result<PathBuf, ModuleError> {
        Ok(contain_name(&self.dir, name)?)
    }

    /// Starts a download; the temp file lives in the download directory.
    pub fn begin(
        &self,
        name: &str,
        expected_length: Option<u64>,
        expected_sha384: Option<Vec<u8>>,
    ) -> Result<StagedFile, ModuleError> {
        let destination = self.name_to_path(name)?;
        tracing::debug!(name, destination = %destination.display(), "download started");
        let mut staged = StagedFile::create(&self.dir, DOWNLOAD_TEMP_PREFIX, destination)?;
        if let Some(length) = expected_length {
            staged = staged.expect_length(length);
        }
        if let Some(digest) = expected_sha384 {
            staged = staged.expect_sha384(digest);
        }
        Ok(staged)
    }
}
