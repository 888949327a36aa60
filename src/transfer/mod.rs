//! Chunked transfer engine: moves bytes from a generic byte source into a
//! stream in bounded pieces.
//!
//! Used in two places:
//! - directly, to stream an arbitrary reader into a socket
//!   (`StreamSocket::stream_from`);
//! - as the file-transfer path for transports without a kernel zero-copy
//!   primitive. A TLS session must pass every byte through the record layer,
//!   so its file sends always land here.
//!
//! The engine reads sequentially, never seeks, and treats running out of
//! source bytes as a normal end of transfer rather than a failure.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::Result;

// ── Options ──────────────────────────────────────────────────────────────────

/// Bounds and tuning for a single transfer or receive.
///
/// `None` is the unbounded sentinel for `size` and the infinite sentinel for
/// `timeout`; there are no magic numeric values.
#[derive(Debug, Clone, Copy)]
pub struct TransferOptions {
    /// Bytes to skip from the front of the source before sending.
    pub offset: u64,
    /// Maximum payload bytes to send; `None` reads to end-of-source. A bound
    /// larger than the source degrades to "send everything available".
    pub size: Option<u64>,
    /// Read/send unit in bytes. Must be non-zero.
    pub chunk_size: usize,
    /// Receive deadline; `None` waits indefinitely. Send paths rely on the
    /// transport's own blocking semantics and ignore this field.
    pub timeout: Option<Duration>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            size: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
        }
    }
}

impl TransferOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the first `offset` bytes of the source.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Cap the transfer at `size` payload bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Read and send in `chunk_size`-byte units.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Fail receives that see no data within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Stream `source` into `sink` in `options.chunk_size` pieces, honoring
/// `options.offset` and `options.size`. Returns the payload bytes written.
///
/// Every chunk is a full `chunk_size` read except the final one, which is
/// `size - total` when a bound leaves less than one chunk of budget, or
/// whatever the source had left before end-of-source. Reaching end-of-source
/// before a configured `size` is satisfied is success, not an error; so is a
/// source that ends inside the skipped `offset` region (the transfer simply
/// sends nothing). Source and sink failures abort immediately and propagate
/// unchanged; bytes already written stay written.
pub async fn stream_chunks<R, W>(
    source: &mut R,
    sink: &mut W,
    options: &TransferOptions,
) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    if options.chunk_size == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "chunk_size must be non-zero").into());
    }

    let mut buf = vec![0u8; options.chunk_size];

    if options.offset > 0 && !discard_prefix(source, options.offset, &mut buf).await? {
        // Source ended inside the skipped region: nothing to send.
        return Ok(0);
    }

    let mut total_sent: u64 = 0;
    loop {
        let want = match options.size {
            Some(size) => {
                let remaining = size - total_sent;
                if remaining == 0 {
                    break;
                }
                remaining.min(options.chunk_size as u64) as usize
            }
            None => options.chunk_size,
        };

        let got = fill(source, &mut buf[..want]).await?;
        if got == 0 {
            break;
        }
        sink.write_all(&buf[..got]).await?;
        total_sent += got as u64;
    }

    sink.flush().await?;
    debug!(event = "transfer_complete", total_sent, "chunked transfer finished");
    Ok(total_sent)
}

/// Discard exactly `offset` bytes from the front of `source`.
///
/// Returns `false` if the source ended before the full prefix was consumed.
async fn discard_prefix<R>(source: &mut R, offset: u64, scratch: &mut [u8]) -> Result<bool>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut remaining = offset;
    while remaining > 0 {
        let want = remaining.min(scratch.len() as u64) as usize;
        let got = source.read(&mut scratch[..want]).await?;
        if got == 0 {
            return Ok(false);
        }
        remaining -= got as u64;
    }
    Ok(true)
}

/// Read until `buf` is full or the source ends; returns the bytes read.
///
/// Sources are free to return short reads; re-issuing keeps every forwarded
/// chunk at its full requested size except the last one.
async fn fill<R>(source: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let got = source.read(&mut buf[filled..]).await?;
        if got == 0 {
            break;
        }
        filled += got;
    }
    Ok(filled)
}

// ── Tests ────────────────────────────────────────────────────────────────────
