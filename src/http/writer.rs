use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // End of headers
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes all of `buf`, retrying short writes, then flushes.
///
/// A write that accepts zero bytes is reported as [`io::ErrorKind::WriteZero`].
pub async fn write_fully<W>(stream: &mut W, buf: &[u8]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while written < buf.len() {
        let n = stream.write(&buf[written..]).await?;

        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "connection closed while writing",
            ));
        }

        written += n;
    }

    stream.flush().await?;
    Ok(written)
}

pub async fn write_response<W>(stream: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_fully(stream, &serialize_response(response)).await?;
    Ok(())
}
