//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::{IpAddr, SocketAddrV4};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use courier::proxy::{Connect, Resolve};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

pub const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";
pub const INTERNAL_PROXY_ERROR: &[u8] =
    b"HTTP/1.1 500 Internal Proxy Error\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";
pub const BAD_GATEWAY: &[u8] = b"HTTP/1.1 502 Bad Gateway\r\nConnection: close\r\nContent-Length: 0\r\n\r\n";

/// Resolver answering from a fixed table and counting lookups.
#[derive(Default)]
pub struct StubResolver {
    entries: HashMap<String, Vec<IpAddr>>,
    calls: AtomicUsize,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, host: &str, addrs: &[&str]) -> Self {
        let addrs = addrs.iter().map(|a| a.parse().unwrap()).collect();
        self.entries.insert(host.to_string(), addrs);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolve for StubResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .get(host)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such host"))
    }
}

/// Connector whose upstreams are in-memory origins replying with a canned
/// response after reading the request head.
pub struct ScriptedConnector {
    response: Vec<u8>,
    refuse: bool,
    connects: Mutex<Vec<SocketAddrV4>>,
    received: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedConnector {
    pub fn new(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            refuse: false,
            connects: Mutex::new(Vec::new()),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(b"")
        }
    }

    pub fn connects(&self) -> Vec<SocketAddrV4> {
        self.connects.lock().unwrap().clone()
    }

    /// Bytes the origin read before answering.
    pub fn received(&self) -> Vec<u8> {
        self.received.lock().unwrap().clone()
    }
}

impl Connect for ScriptedConnector {
    type Stream = DuplexStream;

    async fn connect(&self, addr: SocketAddrV4) -> io::Result<DuplexStream> {
        self.connects.lock().unwrap().push(addr);
        if self.refuse {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }

        let (proxy_side, mut origin) = tokio::io::duplex(64 * 1024);
        let response = self.response.clone();
        let received = Arc::clone(&self.received);

        tokio::spawn(async move {
            let mut request = Vec::new();
            let mut temp = [0u8; 8192];
            loop {
                let n = origin.read(&mut temp).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&temp[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            *received.lock().unwrap() = request;
            let _ = origin.write_all(&response).await;
        });

        Ok(proxy_side)
    }
}

/// Connector returning an upstream that fails on read, and optionally on write.
pub struct BrokenConnector {
    pub fail_write: bool,
}

impl Connect for BrokenConnector {
    type Stream = BrokenUpstream;

    async fn connect(&self, _addr: SocketAddrV4) -> io::Result<BrokenUpstream> {
        Ok(BrokenUpstream {
            fail_write: self.fail_write,
        })
    }
}

pub struct BrokenUpstream {
    fail_write: bool,
}

impl AsyncRead for BrokenUpstream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")))
    }
}

impl AsyncWrite for BrokenUpstream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_write {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")))
        } else {
            Poll::Ready(Ok(buf.len()))
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Reader yielding one queued chunk per read, then EOF or an error.
pub struct ChunkedReader {
    chunks: VecDeque<Vec<u8>>,
    fail_at_end: bool,
    pub reads: usize,
}

impl ChunkedReader {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            fail_at_end: false,
            reads: 0,
        }
    }

    pub fn failing_after(chunks: &[&[u8]]) -> Self {
        Self {
            fail_at_end: true,
            ..Self::new(chunks)
        }
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.reads += 1;

        match this.chunks.pop_front() {
            Some(mut chunk) => {
                let n = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..n]);
                if n < chunk.len() {
                    this.chunks.push_front(chunk.split_off(n));
                }
                Poll::Ready(Ok(()))
            }
            None if this.fail_at_end => {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")))
            }
            None => Poll::Ready(Ok(())),
        }
    }
}

/// Writer accepting at most `max_write` bytes per call.
pub struct TrickleWriter {
    pub data: Vec<u8>,
    pub writes: usize,
    max_write: usize,
}

impl TrickleWriter {
    pub fn new(max_write: usize) -> Self {
        Self {
            data: Vec::new(),
            writes: 0,
            max_write,
        }
    }
}

impl AsyncWrite for TrickleWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = buf.len().min(this.max_write);
        this.data.extend_from_slice(&buf[..n]);
        this.writes += 1;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
