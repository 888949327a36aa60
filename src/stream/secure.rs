//! Secure-stream backend: the contract over a TLS session.
//!
//! Send, receive, and shutdown map onto the TLS stream's own primitives.
//! File transfer has no zero-copy option here: every byte must cross the
//! record layer, so it always runs through the chunked engine, with an
//! unset size resolved against the file's length first.

use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsStream;
use tracing::debug;

use super::plain::shut_read;
use super::{read_with_timeout, ShutdownMode};
use crate::error::{Result, StreamError};
use crate::transfer::{self, TransferOptions};

/// Bounded receive with TLS closure normalization.
///
/// A clean shutdown surfaces as a zero-length read; a peer that vanished
/// without sending `close_notify` surfaces as an abrupt-close error. Both
/// mean "peer closed" to callers, so both map to `None`.
pub(crate) async fn recv(
    stream: &mut TlsStream<TcpStream>,
    len: usize,
    timeout: Option<Duration>,
) -> Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; len];
    let got = match read_with_timeout(stream, &mut buf, timeout).await {
        Ok(got) => got,
        Err(StreamError::Io(e)) if closed_without_notify(&e) => 0,
        Err(e) => return Err(e),
    };
    if got == 0 {
        return Ok(None);
    }
    buf.truncate(got);
    Ok(Some(buf))
}

/// True when the error is the record layer's "peer closed without
/// `close_notify`" signal.
fn closed_without_notify(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::UnexpectedEof
}

/// Transfer `path` through the chunked engine.
///
/// An unset size resolves to the rest of the file past `offset` so the
/// bound is explicit before chunking starts; the engine then performs the
/// offset skip and the bounded chunk loop.
pub(crate) async fn send_file(
    stream: &mut TlsStream<TcpStream>,
    path: &Path,
    options: &TransferOptions,
) -> Result<u64> {
    let mut file = tokio::fs::File::open(path).await?;
    let file_len = file.metadata().await?.len();
    let bounded = TransferOptions {
        size: Some(resolve_size(file_len, options)),
        ..*options
    };

    debug!(
        event = "file_send_start",
        path = %path.display(),
        offset = bounded.offset,
        size = ?bounded.size,
        "secure file transfer via chunked engine"
    );
    let sent = transfer::stream_chunks(&mut file, stream, &bounded).await?;
    debug!(event = "file_send_complete", path = %path.display(), sent, "secure file transfer finished");
    Ok(sent)
}

/// Effective size bound: the caller's, or the rest of the file past
/// `offset`. Saturates so an offset past end-of-file yields a zero bound.
fn resolve_size(file_len: u64, options: &TransferOptions) -> u64 {
    options
        .size
        .unwrap_or_else(|| file_len.saturating_sub(options.offset))
}

/// Map the shutdown mode onto the TLS session and its underlying socket.
///
/// The write direction sends `close_notify` before closing; the read
/// direction half-closes the inner TCP stream, since the record layer has
/// no read-side teardown of its own.
pub(crate) async fn shutdown(stream: &mut TlsStream<TcpStream>, mode: ShutdownMode) -> Result<()> {
    match mode {
        ShutdownMode::Read => shut_read(stream.get_ref().0)?,
        ShutdownMode::Write => stream.shutdown().await?,
        ShutdownMode::Both => {
            stream.shutdown().await?;
            shut_read(stream.get_ref().0)?;
        }
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────
