//! Command layer for device onboarding.
//!
//! Parses and validates the `onboard` flags into a session, gates on device
//! lifecycle state, runs the orchestrator, and persists a new credential.

pub mod onboard_args;
pub mod onboard_command;
pub mod tracing_init;
pub mod validation;

pub use onboard_args::OnboardArgs;
pub use onboard_command::*;
pub use tracing_init::init_tracing;
pub use validation::*;
