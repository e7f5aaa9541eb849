use std::{fmt, sync::Arc};

/// Secret key bytes with redacted formatting.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the plaintext bytes for explicit use sites.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Device attestation key types supported by the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKeyType {
    Ec256,
    Ec384,
    Rsa2048,
    Rsa3072,
}

impl DeviceKeyType {
    pub const ALL: [DeviceKeyType; 4] = [Self::Ec256, Self::Ec384, Self::Rsa2048, Self::Rsa3072];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ec256 => "ec256",
            Self::Ec384 => "ec384",
            Self::Rsa2048 => "rsa2048",
            Self::Rsa3072 => "rsa3072",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

/// Opaque handle over the device private key (software or TPM backed).
pub trait DeviceSigner: Send + Sync {
    fn key_type(&self) -> DeviceKeyType;
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, String>;
}

/// Key material loaded alongside the credential.
#[derive(Clone)]
pub struct DeviceKeys {
    pub hmac_sha256: SecretBytes,
    pub hmac_sha384: SecretBytes,
    pub signer: Arc<dyn DeviceSigner>,
}

impl fmt::Debug for DeviceKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceKeys")
            .field("hmac_sha256", &self.hmac_sha256)
            .field("hmac_sha384", &self.hmac_sha384)
            .field("signer", &self.signer.key_type())
            .finish()
    }
}
