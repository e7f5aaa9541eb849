//! Seams onto the external protocol library and transport construction.

use async_trait::async_trait;
use onboard_capabilities::CapabilitySet;
use onboard_core::{
    CipherSuite, DeviceCredential, DeviceInfo, DeviceKeys, KexSuite, RendezvousBlob,
    SessionConfig,
};
use thiserror::Error;
use url::Url;

/// Response to one protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub message_type: u8,
    pub body: Vec<u8>,
}

/// Failures raised while building or using a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("owner returned HTTP {status} for message {message_type}")]
    Status { status: u16, message_type: u8 },
    #[error("invalid transport URL '{0}'")]
    InvalidUrl(String),
    #[error("malformed transport reply: {0}")]
    MalformedReply(String),
    #[error("transport reply exceeds {limit} bytes")]
    ReplyTooLarge { limit: usize },
}

/// A connection bound to one base URL.
#[async_trait]
pub trait Transport: Send + Sync {
    fn base_url(&self) -> &Url;

    async fn send(&self, message_type: u8, body: Vec<u8>) -> Result<TransportReply, TransportError>;
}

/// Builds a ready-to-use transport for a candidate URL.
pub trait TransportFactory: Send + Sync {
    fn connect(&self, url: &Url, insecure_tls: bool) -> Result<Box<dyn Transport>, TransportError>;
}

/// Failure of a single rendezvous or transfer round.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("protocol rejected by peer: {0}")]
    Rejected(String),
    #[error("protocol message malformed: {0}")]
    Malformed(String),
}

/// Everything the transfer phase needs for one attempt.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub credential: DeviceCredential,
    pub keys: DeviceKeys,
    pub device_info: DeviceInfo,
    pub kex_suite: KexSuite,
    pub cipher_suite: CipherSuite,
    pub allow_credential_reuse: bool,
    pub capabilities: CapabilitySet,
}

impl TransferConfig {
    pub fn new(
        session: &SessionConfig,
        credential: &DeviceCredential,
        keys: &DeviceKeys,
        capabilities: CapabilitySet,
    ) -> Self {
        Self {
            credential: credential.clone(),
            keys: keys.clone(),
            device_info: session.device_info.clone(),
            kex_suite: session.kex_suite,
            cipher_suite: session.cipher_suite,
            allow_credential_reuse: true,
            capabilities,
        }
    }
}

/// Rendezvous and transfer rounds supplied by the protocol library.
#[async_trait]
pub trait OnboardingProtocol: Send + Sync {
    async fn rendezvous(
        &self,
        transport: &dyn Transport,
        credential: &DeviceCredential,
        keys: &DeviceKeys,
    ) -> Result<RendezvousBlob, ProtocolError>;

    /// Returns `Ok(None)` when the owner completed without replacing the credential.
    async fn transfer(
        &self,
        transport: &dyn Transport,
        rendezvous: Option<&RendezvousBlob>,
        config: TransferConfig,
    ) -> Result<Option<DeviceCredential>, ProtocolError>;
}
