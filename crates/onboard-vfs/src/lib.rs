//! Sandboxed read-only filesystem view exposed to the upload capability.
//!
//! Configured upload paths are registered under canonical logical names; the
//! owner can only open files whose logical name is registered or sits under a
//! registered directory.

pub mod logical_path;
pub mod virtual_fs;

pub use logical_path::{clean_path, is_well_formed, logical_name, logical_segments};
pub use virtual_fs::*;
