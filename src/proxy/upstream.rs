//! Outbound connections to the origin server.

use std::future::Future;
use std::io;
use std::net::SocketAddrV4;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Opens the single upstream connection a session uses.
pub trait Connect {
    type Stream: AsyncRead + AsyncWrite + Unpin;

    fn connect(&self, addr: SocketAddrV4) -> impl Future<Output = io::Result<Self::Stream>>;
}

/// Plain TCP connector with an optional connect timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    /// `None` waits as long as the OS does.
    connect_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        Self { connect_timeout }
    }
}

impl Connect for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: SocketAddrV4) -> io::Result<TcpStream> {
        let stream = match self.connect_timeout {
            Some(limit) => timeout(limit, TcpStream::connect(addr))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??,
            None => TcpStream::connect(addr).await?,
        };

        tracing::trace!(upstream = %addr, "Connected to upstream");
        Ok(stream)
    }
}
