//! Error types shared across the crate.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by stream and transfer operations.
///
/// Failures are returned to the caller unchanged; nothing in this crate
/// retries, recovers, or panics on a transport fault. A peer that closed the
/// connection is not an error (receives return `Ok(None)`, transfers return
/// the bytes that were sent).
#[derive(Debug, Error)]
pub enum StreamError {
    /// Underlying transport or file-system failure, verbatim.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A receive deadline elapsed before any data arrived.
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StreamError>;
