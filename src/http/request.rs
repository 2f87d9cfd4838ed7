use bytes::BytesMut;

use crate::error::ProxyError;

/// Capacity of the request buffer in the reference configuration.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

pub const MAX_METHOD_LEN: usize = 15;
pub const MAX_URL_LEN: usize = 255;
pub const MAX_VERSION_LEN: usize = 15;
pub const MAX_HOST_LEN: usize = 253;

/// The header/body separator.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Bytes received from the client, bounded by a fixed capacity.
///
/// The buffer never grows past `capacity`. Rewrites check the bound before
/// touching any byte, so a failed rewrite leaves the contents unchanged.
#[derive(Debug, Clone)]
pub struct RawRequest {
    bytes: BytesMut,
    capacity: usize,
}

impl RawRequest {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a request from bytes already in memory.
    ///
    /// Fails with [`ProxyError::Capacity`] if `data` does not fit.
    pub fn from_bytes(data: &[u8], capacity: usize) -> Result<Self, ProxyError> {
        if data.len() > capacity {
            return Err(ProxyError::Capacity {
                required: data.len(),
                capacity,
            });
        }
        let mut raw = Self::with_capacity(capacity);
        raw.bytes.extend_from_slice(data);
        Ok(raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Space left before the buffer is full.
    pub fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Offset of the request line, past any empty lines sent before it.
    pub fn request_start(&self) -> usize {
        let mut start = 0;
        while self.bytes[start..].starts_with(b"\r\n") {
            start += 2;
        }
        start
    }

    /// Offset of the `\r\n\r\n` ending the header block, if it is complete.
    ///
    /// The search begins at the request line, so leading empty lines are
    /// never mistaken for the end of the headers.
    pub fn header_end(&self) -> Option<usize> {
        let start = self.request_start();
        find(&self.bytes[start..], HEADER_TERMINATOR).map(|end| start + end)
    }

    /// Appends as much of `data` as fits and returns how many bytes were taken.
    pub(crate) fn fill(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining());
        self.bytes.extend_from_slice(&data[..n]);
        n
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.bytes
    }
}

/// Request line and Host header extracted from a [`RawRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    pub url: String,
    pub version: String,
    /// Value of the first `Host:` header, if any.
    pub host: Option<String>,
}

impl ParsedRequest {
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
