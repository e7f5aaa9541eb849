use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use url::Url;

/// Transport protocols an owner address can advertise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransportProtocol {
    Tcp,
    Tls,
    Http,
    Coap,
    Https,
    Coaps,
}

impl TransportProtocol {
    /// Maps a protocol code carried by a redirection blob.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Tcp),
            2 => Some(Self::Tls),
            3 => Some(Self::Http),
            4 => Some(Self::Coap),
            5 => Some(Self::Https),
            6 => Some(Self::Coaps),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Tcp => 1,
            Self::Tls => 2,
            Self::Http => 3,
            Self::Coap => 4,
            Self::Https => 5,
            Self::Coaps => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tls => "tls",
            Self::Http => "http",
            Self::Coap => "coap",
            Self::Https => "https",
            Self::Coaps => "coaps",
        }
    }

    /// Returns the URL scheme prefix and default port for web transports.
    pub fn web_scheme(self) -> Option<(&'static str, u16)> {
        match self {
            Self::Http => Some(("http://", 80)),
            Self::Https => Some(("https://", 443)),
            _ => None,
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One owner address listed in a redirection blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_address: Option<String>,
    /// Raw address octets as carried on the wire (4 or 16 bytes when valid).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub transport: TransportProtocol,
}

impl TransferAddress {
    pub fn dns(name: impl Into<String>, transport: TransportProtocol) -> Self {
        Self {
            dns_address: Some(name.into()),
            ip_address: None,
            port: None,
            transport,
        }
    }

    pub fn ip(addr: IpAddr, transport: TransportProtocol) -> Self {
        Self {
            dns_address: None,
            ip_address: Some(ip_octets(addr)),
            port: None,
            transport,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Decodes the raw IP octets, returning `None` for malformed lengths.
    pub fn parsed_ip(&self) -> Option<IpAddr> {
        let octets = self.ip_address.as_deref()?;
        if let Ok(v4) = <[u8; 4]>::try_from(octets) {
            return Some(IpAddr::V4(Ipv4Addr::from(v4)));
        }
        if let Ok(v6) = <[u8; 16]>::try_from(octets) {
            return Some(IpAddr::V6(Ipv6Addr::from(v6)));
        }
        None
    }

    /// Explicit port when one is set and non-zero.
    pub fn explicit_port(&self) -> Option<u16> {
        self.port.filter(|port| *port != 0)
    }
}

fn ip_octets(addr: IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// Prioritized rule describing how to reach rendezvous or owner services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RendezvousDirective {
    #[serde(default)]
    pub bypass: bool,
    pub urls: Vec<Url>,
    #[serde(default, with = "duration_ms")]
    pub delay: Duration,
}

impl RendezvousDirective {
    pub fn new(urls: Vec<Url>) -> Self {
        Self {
            bypass: false,
            urls,
            delay: Duration::ZERO,
        }
    }

    pub fn bypass(urls: Vec<Url>) -> Self {
        Self {
            bypass: true,
            urls,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Signed redirection payload returned by a successful rendezvous round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RendezvousBlob {
    pub owner_addresses: Vec<TransferAddress>,
    /// Signed bytes handed back unchanged to the transfer phase.
    #[serde(default)]
    pub signed_payload: Vec<u8>,
}

impl fmt::Display for RendezvousBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner_addresses=[")?;
        for (index, address) in self.owner_addresses.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{{transport={} dns={} ip={} port={}}}",
                address.transport,
                address.dns_address.as_deref().unwrap_or("-"),
                address
                    .parsed_ip()
                    .map(|ip| ip.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                address
                    .explicit_port()
                    .map(|port| port.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )?;
        }
        write!(f, "] signed_bytes={}", self.signed_payload.len())
    }
}

/// Stored device credential; opaque here apart from its rendezvous directives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceCredential {
    pub guid: String,
    pub device_info: String,
    pub rendezvous: Vec<RendezvousDirective>,
    #[serde(default)]
    pub owner_key_hash: Vec<u8>,
}

/// Device identity descriptor advertised to the owner during transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceInfo {
    pub os: String,
    pub arch: String,
    pub version: String,
    pub device: String,
    pub file_separator: String,
    pub binary_format: String,
}

impl DeviceInfo {
    /// Fills os/arch from the build target.
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            version: "Debian Bookworm".to_string(),
            device: "onboard-client".to_string(),
            file_separator: ";".to_string(),
            binary_format: std::env::consts::ARCH.to_string(),
        }
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::current()
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
