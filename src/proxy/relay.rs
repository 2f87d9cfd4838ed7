use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::http::writer::write_fully;

/// Default chunk size for relaying.
pub const RELAY_CHUNK_SIZE: usize = 4096;

/// Copies `source` into `destination` until `source` reaches EOF.
///
/// Each chunk is written out completely before the next read. Returns the
/// number of bytes copied; the first read or write error aborts the copy.
pub async fn forward_all<R, W>(
    source: &mut R,
    destination: &mut W,
    chunk_size: usize,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(chunk_size);
    let mut total = 0u64;

    loop {
        buffer.clear();
        let n = source.read_buf(&mut buffer).await?;

        if n == 0 {
            break;
        }

        write_fully(destination, &buffer).await?;
        total += n as u64;

        tracing::trace!(chunk = n, total, "Relayed chunk");
    }

    Ok(total)
}
