//! Destination extraction and host resolution.
//!
//! IPv4 only. Literal addresses never reach the lookup; names are resolved
//! once, with no retry and no caching, and the first IPv4 answer wins.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};

use crate::error::ProxyError;

/// Upstream port used when the Host header carries none.
pub const DEFAULT_PORT: u16 = 80;

/// Forward name lookup.
///
/// The seam lets sessions run against a stub instead of the system resolver.
pub trait Resolve {
    fn lookup(&self, host: &str) -> impl Future<Output = io::Result<Vec<IpAddr>>>;
}

/// Resolves through the system resolver via [`tokio::net::lookup_host`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsResolver;

impl Resolve for DnsResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Host and port taken from a `Host:` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    /// Splits `host[:port]`, falling back to `default_port`.
    pub fn from_host_header(value: Option<&str>, default_port: u16) -> Result<Self, ProxyError> {
        let value = value.ok_or(ProxyError::MissingHost)?;

        let (host, port) = match value.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (value, default_port),
        };

        if host.is_empty() {
            return Err(ProxyError::MissingHost);
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Resolves the host and pairs it with the port.
    pub async fn resolve<R: Resolve>(&self, resolver: &R) -> Result<SocketAddrV4, ProxyError> {
        let ip = resolve_host(resolver, &self.host).await?;
        Ok(SocketAddrV4::new(ip, self.port))
    }
}

/// Turns a hostname or IPv4 literal into a connectable address.
pub async fn resolve_host<R: Resolve>(resolver: &R, host: &str) -> Result<Ipv4Addr, ProxyError> {
    if host.is_empty() {
        return Err(ProxyError::MissingHost);
    }

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let addrs = resolver
        .lookup(host)
        .await
        .map_err(|e| ProxyError::Resolution {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

    addrs
        .into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| ProxyError::Resolution {
            host: host.to_string(),
            reason: "no IPv4 address".to_string(),
        })
}

/// Decimal digits only. `u16::from_str` alone would take a leading `+`.
fn parse_port(s: &str) -> Result<u16, ProxyError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProxyError::InvalidPort(s.to_string()));
    }
    match s.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ProxyError::InvalidPort(s.to_string())),
    }
}
