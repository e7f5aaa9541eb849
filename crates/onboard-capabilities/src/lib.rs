//! Service-info capability modules offered to the owner during transfer.
//!
//! Assembles the per-attempt module set from session flags: interop probe,
//! file download, command echo, file upload over the virtual filesystem, and
//! remote fetch. Download and fetch destinations share one containment rule.

pub mod capability_set;
pub mod command_module;
pub mod download_module;
pub mod module_error;
pub mod path_containment;
pub mod staged_file;
pub mod upload_module;
pub mod wget_module;

pub use capability_set::*;
pub use command_module::*;
pub use download_module::*;
pub use module_error::ModuleError;
pub use path_containment::{contain_name, ContainmentError};
pub use staged_file::StagedFile;
pub use upload_module::*;
pub use wget_module::*;
