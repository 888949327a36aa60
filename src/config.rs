//! Centralized configuration constants.
//!
//! All tunable defaults live here so they can be reviewed and adjusted in a
//! single place. Per-call overrides go through `TransferOptions`.

/// Default chunk size in bytes (4 KB).
///
/// Used as the read/send unit for chunked transfers and as the bounded-read
/// size when a receive does not request a specific length. Callers that move
/// large files over fast links usually want a bigger unit via
/// `TransferOptions::with_chunk_size`.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
