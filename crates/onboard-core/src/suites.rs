use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::OnboardError;

/// Session encryption suites accepted for the transfer phase.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    #[default]
    #[serde(rename = "A128GCM")]
    A128Gcm,
    #[serde(rename = "A192GCM")]
    A192Gcm,
    #[serde(rename = "A256GCM")]
    A256Gcm,
    #[serde(rename = "AES-CCM-64-128-128")]
    AesCcm64_128_128,
    #[serde(rename = "AES-CCM-64-128-256")]
    AesCcm64_128_256,
    #[serde(rename = "COSEAES128CBC")]
    CoseAes128Cbc,
    #[serde(rename = "COSEAES128CTR")]
    CoseAes128Ctr,
    #[serde(rename = "COSEAES256CBC")]
    CoseAes256Cbc,
    #[serde(rename = "COSEAES256CTR")]
    CoseAes256Ctr,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 9] = [
        Self::A128Gcm,
        Self::A192Gcm,
        Self::A256Gcm,
        Self::AesCcm64_128_128,
        Self::AesCcm64_128_256,
        Self::CoseAes128Cbc,
        Self::CoseAes128Ctr,
        Self::CoseAes256Cbc,
        Self::CoseAes256Ctr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
            Self::AesCcm64_128_128 => "AES-CCM-64-128-128",
            Self::AesCcm64_128_256 => "AES-CCM-64-128-256",
            Self::CoseAes128Cbc => "COSEAES128CBC",
            Self::CoseAes128Ctr => "COSEAES128CTR",
            Self::CoseAes256Cbc => "COSEAES256CBC",
            Self::CoseAes256Ctr => "COSEAES256CTR",
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherSuite {
    type Err = OnboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.as_str() == value)
            .ok_or_else(|| OnboardError::UnknownCipherSuite(value.to_string()))
    }
}

/// Key-exchange suites accepted for the transfer phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum KexSuite {
    #[serde(rename = "DHKEXid14")]
    DhKexId14,
    #[serde(rename = "DHKEXid15")]
    DhKexId15,
    #[serde(rename = "ASYMKEX2048")]
    AsymKex2048,
    #[serde(rename = "ASYMKEX3072")]
    AsymKex3072,
    #[serde(rename = "ECDH256")]
    Ecdh256,
    #[serde(rename = "ECDH384")]
    Ecdh384,
}

impl KexSuite {
    pub const ALL: [KexSuite; 6] = [
        Self::DhKexId14,
        Self::DhKexId15,
        Self::AsymKex2048,
        Self::AsymKex3072,
        Self::Ecdh256,
        Self::Ecdh384,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DhKexId14 => "DHKEXid14",
            Self::DhKexId15 => "DHKEXid15",
            Self::AsymKex2048 => "ASYMKEX2048",
            Self::AsymKex3072 => "ASYMKEX3072",
            Self::Ecdh256 => "ECDH256",
            Self::Ecdh384 => "ECDH384",
        }
    }

    /// Comma-separated option list used in validation messages.
    pub fn options() -> String {
        Self::ALL
            .iter()
            .map(|suite| suite.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for KexSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KexSuite {
    type Err = OnboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.as_str() == value)
            .ok_or_else(|| OnboardError::UnknownKexSuite {
                name: value.to_string(),
                options: Self::options(),
            })
    }
}
