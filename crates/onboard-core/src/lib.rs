//! Foundational data model shared across onboarding crates.
//!
//! Defines rendezvous directives, owner addresses, device credentials and key
//! material, the immutable session configuration, device lifecycle state, the
//! cooperative cancellation token, and the credential-store seam.

pub mod cancellation;
pub mod credential_store;
pub mod device_keys;
pub mod device_state;
pub mod error;
pub mod session_config;
pub mod suites;
pub mod types;

pub use cancellation::CancellationToken;
pub use credential_store::*;
pub use device_keys::*;
pub use device_state::*;
pub use error::OnboardError;
pub use session_config::*;
pub use suites::*;
pub use types::*;
