use std::{
    io::Write,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha384};
use tempfile::NamedTempFile;

use crate::module_error::ModuleError;

/// Temp file inside a capability directory that becomes the destination
/// only after length and digest checks pass.
///
/// Dropping an uncommitted stage deletes the temp file.
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
    written: u64,
    hasher: Sha384,
    expected_length: Option<u64>,
    expected_sha384: Option<Vec<u8>>,
}

impl StagedFile {
    pub fn create(dir: &Path, prefix: &str, destination: PathBuf) -> Result<Self, ModuleError> {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(dir)
            .map_err(|error| ModuleError::io("failed to create temp file in", dir, error))?;
        Ok(Self {
            temp,
            destination,
            written: 0,
            hasher: Sha384::new(),
            expected_length: None,
            expected_sha384: None,
        })
    }

    pub fn expect_length(mut self, length: u64) -> Self {
        self.expected_length = Some(length);
        self
    }

    pub fn expect_sha384(mut self, digest: Vec<u8>) -> Self {
        self.expected_sha384 = Some(digest);
        self
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), ModuleError> {
        self.temp
            .write_all(chunk)
            .map_err(|error| ModuleError::io("failed to write temp file", self.temp.path(), error))?;
        self.hasher.update(chunk);
        self.written = self.written.saturating_add(chunk.len() as u64);
        Ok(())
    }

    /// Verifies the staged bytes and renames the temp file into place.
    pub fn commit(mut self) -> Result<PathBuf, ModuleError> {
        self.temp
            .flush()
            .map_err(|error| ModuleError::io("failed to flush temp file", self.temp.path(), error))?;

        if let Some(expected) = self.expected_length {
            if expected != self.written {
                return Err(ModuleError::LengthMismatch {
                    expected,
                    actual: self.written,
                });
            }
        }
        if let Some(expected) = &self.expected_sha384 {
            let actual = self.hasher.clone().finalize();
            if actual.as_slice() != expected.as_slice() {
                return Err(ModuleError::DigestMismatch {
                    path: self.destination.clone(),
                });
            }
        }

        if let Some(parent) = self.destination.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| ModuleError::io("failed to create", parent, error))?;
        }
        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|error| ModuleError::io("failed to persist", &destination, error.error))?;
        tracing::debug!(destination = %destination.display(), bytes = self.written, "staged file committed");
        Ok(destination)
    }
}
