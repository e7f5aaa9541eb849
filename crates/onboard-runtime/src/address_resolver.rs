use std::{collections::BTreeSet, net::SocketAddr};

use async_trait::async_trait;
use onboard_core::TransferAddress;
use tokio::net::lookup_host;
use url::Url;

/// Resolvability check applied to DNS owner addresses.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolves(&self, host: &str, port: u16) -> bool;
}

/// Resolver backed by the operating system's name lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolves(&self, host: &str, port: u16) -> bool {
        match lookup_host((host, port)).await {
            Ok(mut addresses) => addresses.next().is_some(),
            Err(error) => {
                tracing::debug!(host, error = %error, "owner host did not resolve");
                false
            }
        }
    }
}

/// Resolver answering from a fixed host list; used where lookups must not
/// leave the process.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: BTreeSet<String>,
}

impl StaticResolver {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolves(&self, host: &str, _port: u16) -> bool {
        self.hosts.contains(host)
    }
}

/// Turns one owner address into zero, one, or two candidate URLs.
///
/// The DNS form comes first, then the IP form. Both share the scheme and port
/// derived from the transport protocol and the optional explicit port.
pub async fn resolve_transfer_address(
    address: &TransferAddress,
    resolver: &dyn HostResolver,
) -> Vec<Url> {
    let Some((scheme, default_port)) = address.transport.web_scheme() else {
        tracing::debug!(transport = %address.transport, "owner address dropped: unsupported transport");
        return Vec::new();
    };
    if address.dns_address.is_none() && address.ip_address.is_none() {
        tracing::error!("owner address dropped: neither dns nor ip is set");
        return Vec::new();
    }
    let port = address.explicit_port().unwrap_or(default_port);
    let mut urls = Vec::with_capacity(2);

    if let Some(host) = address
        .dns_address
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())
    {
        if resolver.resolves(host, port).await {
            push_candidate(&mut urls, format!("{scheme}{}", join_host_port(host, port)));
        } else {
            tracing::debug!(host, "owner dns address dropped: not resolvable");
        }
    }

    match address.parsed_ip() {
        Some(ip) => push_candidate(&mut urls, format!("{scheme}{}", SocketAddr::new(ip, port))),
        None if address.ip_address.is_some() => {
            tracing::debug!("owner ip address dropped: invalid octets");
        }
        None => {}
    }
    urls
}

/// IPv6 literals are bracketed; names and IPv4 are joined as-is.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn push_candidate(urls: &mut Vec<Url>, raw: String) {
    match Url::parse(&raw) {
        Ok(url) => urls.push(url),
        Err(error) => tracing::debug!(url = %raw, error = %error, "owner address dropped: invalid url"),
    }
}
