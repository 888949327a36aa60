//! Plain-stream backend: the contract over an unencrypted TCP stream.
//!
//! Send and receive pass straight through to the socket. File transfer is
//! the interesting part: on Linux the bytes go kernel-to-kernel via
//! `sendfile(2)` and never enter this process; elsewhere the portable
//! chunked engine does the same job with identical output.

use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use super::{read_with_timeout, ShutdownMode};
use crate::error::Result;
use crate::transfer::TransferOptions;

/// Bounded receive.
///
/// TCP signals peer closure as a zero-length read, which maps to `None`.
pub(crate) async fn recv(
    stream: &mut TcpStream,
    len: usize,
    timeout: Option<Duration>,
) -> Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; len];
    let got = read_with_timeout(stream, &mut buf, timeout).await?;
    if got == 0 {
        return Ok(None);
    }
    buf.truncate(got);
    Ok(Some(buf))
}

/// Transfer `path` through the kernel zero-copy path.
#[cfg(target_os = "linux")]
pub(crate) async fn send_file(
    stream: &mut TcpStream,
    path: &Path,
    options: &TransferOptions,
) -> Result<u64> {
    debug!(
        event = "file_send_start",
        path = %path.display(),
        offset = options.offset,
        size = ?options.size,
        "plain file transfer via sendfile"
    );
    let sent = sendfile(stream, path, options).await?;
    debug!(event = "file_send_complete", path = %path.display(), sent, "plain file transfer finished");
    Ok(sent)
}

/// Transfer `path` through the chunked engine (no zero-copy primitive on
/// this target).
#[cfg(not(target_os = "linux"))]
pub(crate) async fn send_file(
    stream: &mut TcpStream,
    path: &Path,
    options: &TransferOptions,
) -> Result<u64> {
    debug!(
        event = "file_send_start",
        path = %path.display(),
        offset = options.offset,
        size = ?options.size,
        "plain file transfer via chunked engine"
    );
    let mut file = tokio::fs::File::open(path).await?;
    let sent = crate::transfer::stream_chunks(&mut file, stream, options).await?;
    debug!(event = "file_send_complete", path = %path.display(), sent, "plain file transfer finished");
    Ok(sent)
}

/// Drive `sendfile(2)` over the nonblocking socket.
///
/// The kernel advances the file offset itself; each call moves at most
/// `chunk_size` bytes so a bounded `size` is honored exactly. A return of
/// zero means the file ran out, which ends the transfer successfully, offset
/// past end-of-file included.
#[cfg(target_os = "linux")]
async fn sendfile(stream: &mut TcpStream, path: &Path, options: &TransferOptions) -> Result<u64> {
    use std::os::unix::io::AsRawFd;
    use tokio::io::Interest;

    if options.chunk_size == 0 {
        return Err(
            io::Error::new(io::ErrorKind::InvalidInput, "chunk_size must be non-zero").into(),
        );
    }

    let file = tokio::fs::File::open(path).await?.into_std().await;
    let file_fd = file.as_raw_fd();
    let sock_fd = stream.as_raw_fd();

    let mut offset = options.offset as libc::off64_t;
    let mut remaining = options.size;
    let mut total: u64 = 0;

    loop {
        let budget = match remaining {
            Some(0) => break,
            Some(left) => left.min(options.chunk_size as u64) as usize,
            None => options.chunk_size,
        };

        stream.writable().await?;
        let result = stream.try_io(Interest::WRITABLE, || {
            let sent = unsafe { libc::sendfile64(sock_fd, file_fd, &mut offset, budget) };
            if sent < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(sent as u64)
            }
        });

        match result {
            Ok(0) => break,
            Ok(sent) => {
                total += sent;
                if let Some(left) = remaining.as_mut() {
                    *left -= sent;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(total)
}

/// Map the shutdown mode onto the socket's half-close primitives.
///
/// The write direction goes through the async shutdown so pending bytes are
/// flushed before the FIN.
pub(crate) async fn shutdown(stream: &mut TcpStream, mode: ShutdownMode) -> Result<()> {
    match mode {
        ShutdownMode::Read => shut_read(stream)?,
        ShutdownMode::Write => stream.shutdown().await?,
        ShutdownMode::Both => {
            stream.shutdown().await?;
            shut_read(stream)?;
        }
    }
    Ok(())
}

/// Close the receive direction of a live socket.
///
/// Tokio exposes no directional shutdown, so this goes to `shutdown(2)`
/// with `SHUT_RD` on the raw descriptor.
#[cfg(unix)]
pub(crate) fn shut_read(stream: &TcpStream) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::shutdown(stream.as_raw_fd(), libc::SHUT_RD) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub(crate) fn shut_read(_stream: &TcpStream) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "read-direction shutdown requires a unix target",
    ))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::path::PathBuf;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("unisock_test")
            .join("plain")
            .join(name);
        let _ = std::fs::create_dir_all(&dir);
        dir
    }

    fn cleanup(path: &Path) {
        let _ = std::fs::remove_dir_all(path);
    }

    /// Patterned bytes so offset mistakes show up in content comparisons.
    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, server) = tokio::join!(TcpStream::connect(addr), listener.accept());
        (client.unwrap(), server.unwrap().0)
    }

    #[tokio::test]
    async fn file_send_delivers_whole_file() -> Result<()> {
        let dir = test_dir("whole_file");
        let path = dir.join("payload.bin");
        let data = pattern(10_000);
        std::fs::write(&path, &data)?;

        let (mut client, mut server) = tcp_pair().await;
        let sent = send_file(&mut client, &path, &TransferOptions::default()).await?;
        assert_eq!(sent, 10_000);

        let mut got = vec![0u8; 10_000];
        server.read_exact(&mut got).await?;
        assert_eq!(got, data);

        cleanup(&dir);
        Ok(())
    }

    #[tokio::test]
    async fn file_send_honors_offset_and_size() -> Result<()> {
        let dir = test_dir("window");
        let path = dir.join("payload.bin");
        let data = pattern(10_000);
        std::fs::write(&path, &data)?;

        let (mut client, mut server) = tcp_pair().await;
        let opts = TransferOptions::new()
            .with_offset(100)
            .with_size(500)
            .with_chunk_size(256);
        let sent = send_file(&mut client, &path, &opts).await?;
        assert_eq!(sent, 500);

        let mut got = vec![0u8; 500];
        server.read_exact(&mut got).await?;
        assert_eq!(got, &data[100..600]);

        cleanup(&dir);
        Ok(())
    }

    #[tokio::test]
    async fn file_send_with_offset_past_end_sends_nothing() -> Result<()> {
        let dir = test_dir("past_end");
        let path = dir.join("tiny.bin");
        std::fs::write(&path, pattern(10))?;

        let (mut client, mut server) = tcp_pair().await;
        let opts = TransferOptions::new().with_offset(20);
        let sent = send_file(&mut client, &path, &opts).await?;
        assert_eq!(sent, 0);

        // Closing our end lets the peer observe a clean zero-byte stream.
        drop(client);
        let mut got = Vec::new();
        server.read_to_end(&mut got).await?;
        assert!(got.is_empty());

        cleanup(&dir);
        Ok(())
    }

    #[tokio::test]
    async fn file_send_bound_larger_than_file_degrades_to_eof() -> Result<()> {
        let dir = test_dir("oversized_bound");
        let path = dir.join("payload.bin");
        let data = pattern(1000);
        std::fs::write(&path, &data)?;

        let (mut client, mut server) = tcp_pair().await;
        let opts = TransferOptions::new().with_size(5000).with_chunk_size(256);
        let sent = send_file(&mut client, &path, &opts).await?;
        assert_eq!(sent, 1000);

        let mut got = vec![0u8; 1000];
        server.read_exact(&mut got).await?;
        assert_eq!(got, data);

        cleanup(&dir);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_surfaces_the_open_error() {
        let dir = test_dir("missing");
        let path = dir.join("does-not-exist.bin");

        let (mut client, _server) = tcp_pair().await;
        let err = send_file(&mut client, &path, &TransferOptions::default())
            .await
            .unwrap_err();

        match err {
            crate::error::StreamError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("expected Io error, got {other:?}"),
        }

        cleanup(&dir);
    }
}
