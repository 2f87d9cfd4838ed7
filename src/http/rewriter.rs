//! In-place request rewriting before the request is sent upstream.

use url::Url;

use crate::error::ProxyError;
use crate::http::request::{RawRequest, find};

/// Header inserted in front of the header terminator, leading CRLF included.
pub const CONNECTION_CLOSE: &[u8] = b"\r\nConnection: close";

/// Inserts `Connection: close` as the last header line.
///
/// Every byte from the end of the header block onward, including any body bytes
/// already buffered, moves right by [`CONNECTION_CLOSE`]'s length, and the
/// header fills the gap. Returns the new length.
///
/// Nothing is modified when the request has no header terminator or when the
/// result would not leave at least one free byte in the buffer.
pub fn inject_connection_close(raw: &mut RawRequest) -> Result<usize, ProxyError> {
    let len = raw.len();
    let separator = raw
        .header_end()
        .ok_or(ProxyError::Malformed("missing header terminator"))?;

    let required = len + CONNECTION_CLOSE.len();
    if required >= raw.capacity() {
        return Err(ProxyError::Capacity {
            required,
            capacity: raw.capacity(),
        });
    }

    let bytes = raw.bytes_mut();
    bytes.resize(required, 0);
    bytes.copy_within(separator..len, separator + CONNECTION_CLOSE.len());
    bytes[separator..separator + CONNECTION_CLOSE.len()].copy_from_slice(CONNECTION_CLOSE);

    Ok(required)
}

/// Rewrites an absolute `http://` request target to origin form.
///
/// `GET http://example.com/a?b HTTP/1.1` becomes `GET /a?b HTTP/1.1`; a
/// target with no path becomes `/`. Requests already in origin form, or with
/// any other target, are returned untouched. Returns the new length.
pub fn rewrite_absolute_target(raw: &mut RawRequest) -> Result<usize, ProxyError> {
    let start = raw.request_start();
    let bytes = raw.as_bytes();

    let line_len = find(&bytes[start..], b"\r\n")
        .ok_or(ProxyError::Malformed("missing request line terminator"))?;
    let line = std::str::from_utf8(&bytes[start..start + line_len])
        .map_err(|_| ProxyError::Malformed("request line is not valid UTF-8"))?;

    let fields: Vec<&str> = line.split([' ', '\t']).filter(|f| !f.is_empty()).collect();
    let [method, target, version] = fields[..] else {
        return Err(ProxyError::Malformed("request line is not METHOD URL VERSION"));
    };

    let Some(origin) = origin_form(target) else {
        return Ok(raw.len());
    };

    let new_line = format!("{method} {origin} {version}");
    let required = raw.len() - line_len + new_line.len();
    if required >= raw.capacity() {
        return Err(ProxyError::Capacity {
            required,
            capacity: raw.capacity(),
        });
    }

    let mut rewritten = Vec::with_capacity(required);
    rewritten.extend_from_slice(&bytes[..start]);
    rewritten.extend_from_slice(new_line.as_bytes());
    rewritten.extend_from_slice(&bytes[start + line_len..]);

    let buf = raw.bytes_mut();
    buf.clear();
    buf.extend_from_slice(&rewritten);

    Ok(required)
}

/// Path and query of an absolute `http://` target, sliced from the original
/// text so the client's encoding is preserved.
fn origin_form(target: &str) -> Option<String> {
    let url = Url::parse(target).ok()?;
    if url.scheme() != "http" || url.host_str().is_none() {
        return None;
    }

    let authority_start = target.find("://")? + 3;
    let rest = &target[authority_start..];

    let origin = match rest.find(['/', '?']) {
        Some(i) if rest[i..].starts_with('?') => format!("/{}", &rest[i..]),
        Some(i) => rest[i..].to_string(),
        None => "/".to_string(),
    };

    Some(origin)
}
