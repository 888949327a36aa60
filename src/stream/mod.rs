//! Unified stream socket: one handle over plain TCP and TLS transports.
//!
//! A [`StreamSocket`] is an already-connected endpoint, typed as plain or
//! secure at construction. Every contract operation (send, receive, file
//! transfer, shutdown) dispatches by variant to the matching backend, so
//! calling code never branches on connection type. The variant set is
//! closed: exactly two transports exist, and dispatch is a `match` rather
//! than a trait object.
//!
//! Both backends share one closure convention: a peer that has closed the
//! connection surfaces as `Ok(None)` from receives, never as an error, even
//! though the two transports natively signal closure differently (TCP as a
//! zero-length read, TLS sometimes as an abrupt-close error).

mod plain;
mod secure;

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsStream;

use crate::error::{Result, StreamError};
use crate::transfer::{self, TransferOptions};

// ── Shutdown mode ────────────────────────────────────────────────────────────

/// Which direction(s) of a connection to shut down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Close the receive direction; local reads return end-of-stream.
    Read,
    /// Flush and close the send direction (FIN, preceded by `close_notify`
    /// on the secure transport). The peer observes end-of-stream; the
    /// receive direction stays usable.
    Write,
    /// Close both directions.
    #[default]
    Both,
}

// ── Stream socket ────────────────────────────────────────────────────────────

/// An open, connected byte-stream endpoint, plain or TLS-secured.
///
/// The handle is exclusively owned by its caller; operations borrow it for
/// their duration and retain nothing afterwards. Operations on one handle
/// are expected to be issued sequentially; the handle performs no internal
/// locking.
pub enum StreamSocket {
    /// Unencrypted TCP stream.
    Plain(TcpStream),
    /// TLS session (client- or server-side) layered over TCP.
    Secure(Box<TlsStream<TcpStream>>),
}

impl StreamSocket {
    /// Whether this handle runs over the secure transport.
    pub fn is_secure(&self) -> bool {
        matches!(self, StreamSocket::Secure(_))
    }

    /// Remote address of the underlying socket.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().peer_addr()
    }

    /// Local address of the underlying socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().local_addr()
    }

    /// Write all of `data` to the transport.
    ///
    /// Suspends until the transport has accepted every byte or failed; the
    /// flush pushes any buffered TLS records and is a no-op on plain TCP.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.write_all(data).await?;
        self.flush().await?;
        Ok(())
    }

    /// Receive with the default length and no deadline.
    ///
    /// Equivalent to `recv_with(0, &TransferOptions::default())`.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        self.recv_with(0, &TransferOptions::default()).await
    }

    /// Read up to `len` bytes, honoring `options.timeout`.
    ///
    /// A `len` of `0` means "transport-default size", i.e.
    /// `options.chunk_size`. Returns `Ok(None)` when the peer has closed the
    /// connection; an elapsed deadline is [`StreamError::Timeout`].
    pub async fn recv_with(
        &mut self,
        len: usize,
        options: &TransferOptions,
    ) -> Result<Option<Vec<u8>>> {
        let len = if len == 0 { options.chunk_size } else { len };
        if len == 0 {
            // A zero-length socket read is indistinguishable from closure.
            return Err(
                io::Error::new(io::ErrorKind::InvalidInput, "chunk_size must be non-zero").into(),
            );
        }
        match self {
            StreamSocket::Plain(s) => plain::recv(s, len, options.timeout).await,
            StreamSocket::Secure(s) => secure::recv(s, len, options.timeout).await,
        }
    }

    /// Transfer the whole file at `path` with default options.
    pub async fn send_file(&mut self, path: impl AsRef<Path>) -> Result<u64> {
        self.send_file_with(path, &TransferOptions::default()).await
    }

    /// Transfer the file at `path`, bounded by `options.offset` and
    /// `options.size`. Returns the payload bytes sent.
    ///
    /// The observable effect is identical on both transports; only the
    /// mechanism differs (kernel zero-copy where available on plain TCP,
    /// the chunked engine on TLS). An offset at or past the end of the file
    /// sends nothing and succeeds.
    pub async fn send_file_with(
        &mut self,
        path: impl AsRef<Path>,
        options: &TransferOptions,
    ) -> Result<u64> {
        let path = path.as_ref();
        match self {
            StreamSocket::Plain(s) => plain::send_file(s, path, options).await,
            StreamSocket::Secure(s) => secure::send_file(s, path, options).await,
        }
    }

    /// Stream an arbitrary readable source into the socket through the
    /// chunked engine. Returns the payload bytes sent.
    pub async fn stream_from<R>(&mut self, source: &mut R, options: &TransferOptions) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        transfer::stream_chunks(source, self, options).await
    }

    /// Half- or fully-close the connection per `mode`.
    pub async fn shutdown(&mut self, mode: ShutdownMode) -> Result<()> {
        match self {
            StreamSocket::Plain(s) => plain::shutdown(s, mode).await,
            StreamSocket::Secure(s) => secure::shutdown(s, mode).await,
        }
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            StreamSocket::Plain(s) => s,
            StreamSocket::Secure(s) => s.get_ref().0,
        }
    }
}

impl From<TcpStream> for StreamSocket {
    fn from(stream: TcpStream) -> Self {
        StreamSocket::Plain(stream)
    }
}

impl From<TlsStream<TcpStream>> for StreamSocket {
    fn from(stream: TlsStream<TcpStream>) -> Self {
        StreamSocket::Secure(Box::new(stream))
    }
}

impl From<tokio_rustls::client::TlsStream<TcpStream>> for StreamSocket {
    fn from(stream: tokio_rustls::client::TlsStream<TcpStream>) -> Self {
        StreamSocket::Secure(Box::new(TlsStream::Client(stream)))
    }
}

impl From<tokio_rustls::server::TlsStream<TcpStream>> for StreamSocket {
    fn from(stream: tokio_rustls::server::TlsStream<TcpStream>) -> Self {
        StreamSocket::Secure(Box::new(TlsStream::Server(stream)))
    }
}

// Pass-through I/O impls so the handle composes with generic tokio code
// (including the chunked engine, whose sink side is any `AsyncWrite`).

impl AsyncRead for StreamSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            StreamSocket::Plain(s) => Pin::new(s).poll_read(cx, buf),
            StreamSocket::Secure(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for StreamSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            StreamSocket::Plain(s) => Pin::new(s).poll_write(cx, buf),
            StreamSocket::Secure(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            StreamSocket::Plain(s) => Pin::new(s).poll_flush(cx),
            StreamSocket::Secure(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            StreamSocket::Plain(s) => Pin::new(s).poll_shutdown(cx),
            StreamSocket::Secure(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

// ── Shared backend helpers ───────────────────────────────────────────────────

/// Bounded read with an optional deadline.
///
/// `Ok(0)` is the caller's signal that the transport reported end-of-stream;
/// how that maps to "peer closed" is each backend's concern.
pub(crate) async fn read_with_timeout<R>(
    stream: &mut R,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, stream.read(buf)).await {
            Ok(read) => Ok(read?),
            Err(_) => Err(StreamError::Timeout(limit)),
        },
        None => Ok(stream.read(buf).await?),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
