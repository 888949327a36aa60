//! Unified stream sockets: plain TCP and TLS behind one handle.
//!
//! Callers hold a [`StreamSocket`] that is already connected and already
//! typed as plain or secure; every operation dispatches to the matching
//! transport. The crate deliberately stops at the byte level: no connection
//! establishment, no framing, no retries. What it does provide:
//!
//! - [`StreamSocket::send`] / [`StreamSocket::recv`]: bounded byte I/O with
//!   one closure convention across both transports (a closed peer is
//!   `Ok(None)`, never an error).
//! - [`StreamSocket::send_file`]: file transfer bounded by offset and size.
//!   The plain transport uses the kernel zero-copy path where the platform
//!   has one; the secure transport streams through the chunked engine,
//!   since encrypted transports cannot hand a file descriptor to the kernel.
//! - [`StreamSocket::shutdown`]: directional half-close.
//! - [`stream_chunks`]: the chunked engine itself, usable with any
//!   `AsyncRead` source.
//!
//! ```no_run
//! use std::path::Path;
//! use unisock::{StreamSocket, TransferOptions};
//!
//! # async fn demo() -> Result<(), unisock::StreamError> {
//! let tcp = tokio::net::TcpStream::connect("127.0.0.1:9000").await?;
//! let mut sock = StreamSocket::from(tcp);
//!
//! sock.send(b"hello").await?;
//! let _reply = sock.recv().await?;
//!
//! let opts = TransferOptions::new().with_offset(100).with_size(500);
//! sock.send_file_with(Path::new("payload.bin"), &opts).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod stream;
pub mod transfer;

pub use error::{Result, StreamError};
pub use stream::{ShutdownMode, StreamSocket};
pub use transfer::{stream_chunks, TransferOptions};
