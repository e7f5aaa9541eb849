use std::{io, path::PathBuf};

use onboard_vfs::VfsError;
use thiserror::Error;

use crate::path_containment::ContainmentError;

/// Failures raised while a capability module serves an owner request.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Containment(#[from] ContainmentError),
    #[error(transparent)]
    Vfs(#[from] VfsError),
    #[error("{context} '{}': {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("command timed out after {timeout_ms} ms")]
    CommandTimeout { timeout_ms: u128 },
    #[error("remote fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid fetch URL '{0}'")]
    InvalidUrl(String),
    #[error("length mismatch: expected {expected} bytes, received {actual}")]
    LengthMismatch { expected: u64, actual: u64 },
    #[error("sha-384 digest mismatch for '{}'", path.display())]
    DigestMismatch { path: PathBuf },
}

impl ModuleError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
