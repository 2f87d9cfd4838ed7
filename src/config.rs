use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, ensure};
use serde::Deserialize;

use crate::http::request::DEFAULT_BUFFER_CAPACITY;
use crate::http::rewriter::CONNECTION_CLOSE;
use crate::proxy::relay::RELAY_CHUNK_SIZE;
use crate::proxy::resolver::DEFAULT_PORT;

/// Runtime configuration.
///
/// Every field has a default, so running without a file gives the reference
/// setup: 4096-byte request buffer, upstream port 80.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
        }
    }
}

/// Per-session knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Upper bound on a client request, headers plus any buffered body.
    pub buffer_capacity: usize,
    pub relay_chunk_size: usize,
    /// Upstream port when the Host header has none.
    pub default_port: u16,
    /// 0 disables the timeout.
    pub connect_timeout_ms: u64,
    /// Deadline for each client read while the request head is assembled.
    /// 0 disables the timeout.
    pub request_read_timeout_ms: u64,
    /// Send `/path` instead of `http://host/path` upstream.
    pub rewrite_absolute_target: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            relay_chunk_size: RELAY_CHUNK_SIZE,
            default_port: DEFAULT_PORT,
            connect_timeout_ms: 10_000,
            request_read_timeout_ms: 5_000,
            rewrite_absolute_target: false,
        }
    }
}

impl ProxyConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    pub fn request_read_timeout(&self) -> Option<Duration> {
        (self.request_read_timeout_ms > 0)
            .then(|| Duration::from_millis(self.request_read_timeout_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads from a YAML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let cfg = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("loading config {}", path.display()))?
            }
            None => Self::default(),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.proxy.buffer_capacity > CONNECTION_CLOSE.len() + 4,
            "proxy.buffer_capacity must be larger than {} bytes",
            CONNECTION_CLOSE.len() + 4
        );
        ensure!(self.proxy.relay_chunk_size > 0, "proxy.relay_chunk_size must be non-zero");
        ensure!(self.proxy.default_port > 0, "proxy.default_port must be non-zero");
        ensure!(self.server.port > 0, "server.port must be non-zero");
        Ok(())
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.bind_addr, self.server.port)
    }
}
