use std::path::{Path, PathBuf};

use onboard_vfs::clean_path;
use thiserror::Error;

/// Received file names that cannot be placed inside the target directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainmentError {
    #[error("file name '{0}' does not name a file")]
    EmptyName(String),
}

/// Resolves an owner-supplied file name to a path inside `dir`.
///
/// The name is cleaned first. Names that are absolute or climb out of `dir`
/// keep only their base name; everything else is joined under `dir`.
pub fn contain_name(dir: &Path, name: &str) -> Result<PathBuf, ContainmentError> {
    let cleaned = clean_path(name);
    let escapes = cleaned.starts_with('/') || cleaned == ".." || cleaned.starts_with("../");

    let relative = if escapes {
        cleaned
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .filter(|segment| *segment != "..")
            .map(str::to_string)
    } else {
        Some(cleaned).filter(|value| value != ".")
    };

    match relative {
        Some(relative) => Ok(dir.join(relative)),
        None => Err(ContainmentError::EmptyName(name.to_string())),
    }
}
