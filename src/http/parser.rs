use crate::error::ProxyError;
use crate::http::request::{
    MAX_HOST_LEN, MAX_METHOD_LEN, MAX_URL_LEN, MAX_VERSION_LEN, ParsedRequest, find,
};

/// Extracts the request line and Host header from raw client bytes.
///
/// Lines are split on CRLF. Empty lines before the request line are skipped,
/// and header scanning stops at the blank line ending the header block. A
/// request without a Host header parses fine; the missing host is reported
/// later, when the destination is resolved.
pub fn parse_http_request(buf: &[u8]) -> Result<ParsedRequest, ParseError> {
    let mut lines = crlf_lines(buf).skip_while(|line| line.is_empty());

    // Request line
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let request_line =
        std::str::from_utf8(request_line).map_err(|_| ParseError::InvalidRequest)?;

    let mut parts = request_line.split([' ', '\t']).filter(|p| !p.is_empty());

    let method = bounded(parts.next(), MAX_METHOD_LEN)?;
    let url = bounded(parts.next(), MAX_URL_LEN)?;
    let version = bounded(parts.next(), MAX_VERSION_LEN)?;

    if parts.next().is_some() {
        return Err(ParseError::InvalidRequest);
    }

    // Headers
    let mut host = None;

    for line in lines.take_while(|line| !line.is_empty()) {
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            continue;
        };

        if !line[..colon].eq_ignore_ascii_case(b"host") {
            continue;
        }

        let value = std::str::from_utf8(&line[colon + 1..])
            .map_err(|_| ParseError::InvalidHeader)?
            .trim_matches(|c: char| c == ' ' || c == '\t');

        if value.len() > MAX_HOST_LEN {
            return Err(ParseError::HostTooLong);
        }

        host = Some(value.to_string());
        break;
    }

    Ok(ParsedRequest {
        method,
        url,
        version,
        host,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    FieldTooLong,
    InvalidHeader,
    HostTooLong,
}

impl ParseError {
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::InvalidRequest => "request line is not METHOD URL VERSION",
            ParseError::FieldTooLong => "request line field too long",
            ParseError::InvalidHeader => "Host header is not valid UTF-8",
            ParseError::HostTooLong => "Host header too long",
        }
    }
}

impl From<ParseError> for ProxyError {
    fn from(e: ParseError) -> Self {
        ProxyError::Malformed(e.reason())
    }
}

fn bounded(field: Option<&str>, max: usize) -> Result<String, ParseError> {
    let field = field.ok_or(ParseError::InvalidRequest)?;
    if field.len() > max {
        return Err(ParseError::FieldTooLong);
    }
    Ok(field.to_string())
}

/// Splits on CRLF. A trailing line without a terminator is still yielded.
fn crlf_lines(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(buf);
    std::iter::from_fn(move || {
        let current = rest?;
        match find(current, b"\r\n") {
            Some(end) => {
                rest = Some(&current[end + 2..]);
                Some(&current[..end])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
