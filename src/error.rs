//! Failure taxonomy for a single proxy session.
//!
//! Every variant is local to one client connection. [`ProxyError::status`]
//! decides whether the client sees a synthetic response before the
//! connection is closed.

use std::io;
use std::net::SocketAddrV4;

use thiserror::Error;

use crate::http::response::StatusCode;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("malformed request: {0}")]
    Malformed(&'static str),

    #[error("request has no Host header")]
    MissingHost,

    #[error("invalid port in Host header: {0:?}")]
    InvalidPort(String),

    #[error("could not resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("could not connect to upstream {addr}")]
    Connect {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    #[error("rewritten request needs {required} bytes, buffer holds {capacity}")]
    Capacity { required: usize, capacity: usize },

    #[error("failed to read request from client")]
    ClientRead(#[source] io::Error),

    #[error("failed to write request upstream")]
    UpstreamWrite(#[source] io::Error),

    #[error("relay from upstream failed")]
    Relay(#[source] io::Error),
}

impl ProxyError {
    /// The synthetic response owed to the client, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProxyError::Malformed(_)
            | ProxyError::MissingHost
            | ProxyError::InvalidPort(_)
            | ProxyError::Capacity { .. } => Some(StatusCode::BadRequest),
            ProxyError::Resolution { .. }
            | ProxyError::Connect { .. }
            | ProxyError::UpstreamWrite(_) => Some(StatusCode::BadGateway),
            ProxyError::Relay(_) => Some(StatusCode::InternalProxyError),
            ProxyError::ClientRead(_) => None,
        }
    }
}
