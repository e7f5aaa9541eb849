//! Failover and selection engine for device onboarding.
//!
//! Walks rendezvous directives in priority order, turns the redirection blob
//! into transfer candidates, and attempts ownership transfer against each
//! candidate exactly once until one succeeds. The protocol library, transport
//! construction, and name resolution are consumed through trait seams.

pub mod address_resolver;
pub mod http_transport;
pub mod orchestrator;
pub mod outcome;
pub mod protocol;
pub mod rendezvous_walker;
pub mod transfer_walker;

pub use address_resolver::*;
pub use http_transport::HttpTransportFactory;
pub use orchestrator::*;
pub use outcome::*;
pub use protocol::*;
pub use rendezvous_walker::*;
pub use transfer_walker::*;

#[cfg(test)]
pub(crate) mod test_support;
