//! Chunked transfer sessions
//!
//! An upload streams a local byte source to a remote file with the
//! create/append*/flush protocol: bytes are staged by append calls at strictly
//! increasing positions and committed by a single flush naming the final
//! length. The write position only advances after an append is acknowledged,
//! so the committed object is exactly the source bytes, in order, with no
//! gaps. Appends are sequential; the store requires them ordered, and flush
//! must not be issued before every append up to the final position has been
//! acknowledged.
//!
//! Nothing is persisted between calls: a failed upload starts over from
//! position zero, re-creating the destination.

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::{PathStore, ResourceType};

/// Default upload chunk size: 4 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Interrupted)
    } else {
        Ok(())
    }
}

/// Read up to `buf.len()` bytes, returning less only at end of input
async fn fill_chunk<R: AsyncRead + Unpin>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Upload a byte source to `dest`, returning the committed length
///
/// Issues create, then one append of at most `chunk_size` bytes per loop
/// iteration, then flush with the total. A zero-length source still issues
/// create and flush(0) with no appends. Any remote rejection aborts the
/// session immediately. The cancellation token is checked before every
/// remote call.
pub async fn upload<S, R>(
    store: &S,
    dest: &RemotePath,
    mut source: R,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64>
where
    S: PathStore + ?Sized,
    R: AsyncRead + Unpin,
{
    if chunk_size == 0 {
        return Err(Error::InvalidArgument("chunk size must be positive".into()));
    }

    ensure_live(cancel)?;
    store.create_path(dest, ResourceType::File).await?;

    let mut position: u64 = 0;
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = fill_chunk(&mut source, &mut buf).await?;
        if n == 0 {
            break;
        }
        ensure_live(cancel)?;
        store
            .append(dest, position, Bytes::copy_from_slice(&buf[..n]))
            .await?;
        position += n as u64;
        tracing::debug!(path = %dest, position, chunk = n, "appended chunk");
    }

    ensure_live(cancel)?;
    store.flush(dest, position).await?;
    tracing::debug!(path = %dest, length = position, "flushed upload");
    Ok(position)
}

/// Download a remote file into a writer, returning the byte count
///
/// Drains the transport's body stream chunk by chunk; the cancellation token
/// is checked between chunks.
pub async fn download<S, W>(
    store: &S,
    source: &RemotePath,
    mut dest: W,
    cancel: &CancellationToken,
) -> Result<u64>
where
    S: PathStore + ?Sized,
    W: AsyncWrite + Unpin,
{
    ensure_live(cancel)?;
    let mut stream = store.read(source).await?;

    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        ensure_live(cancel)?;
        let chunk = chunk?;
        dest.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    dest.flush().await?;
    Ok(written)
}
