//! Error types for archive ingestion.
//!
//! Only whole-archive failures surface from [`extract`](crate::extract).
//! [`EntryDecodeError`]s are absorbed per entry and reported as diagnostics.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// The archive could not be opened or its central directory is unreadable.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Not a valid ZIP file: end of central directory not found")]
    NotZip,
    #[error("Invalid {0}")]
    InvalidRecord(&'static str),
    #[error("Multi-disk archives are not supported")]
    MultiDisk,
    #[error("Central directory is truncated: expected {expected} entries, read {read}")]
    Truncated { expected: u64, read: u64 },
    #[error("Failed to read archive: {0}")]
    Io(#[from] io::Error),
}

/// A single entry could not be turned into text.
#[derive(Debug, Error)]
pub enum EntryDecodeError {
    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u16),
    #[error("entry is encrypted")]
    Encrypted,
    #[error("invalid local file header")]
    InvalidLocalHeader,
    #[error("entry is too large to load ({0} bytes)")]
    TooLarge(u64),
    #[error("decompression failed: {0}")]
    Inflate(#[source] io::Error),
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("CRC-32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },
    #[error("content is not valid UTF-8 text")]
    NotText(#[from] std::string::FromUtf8Error),
    #[error("failed to read entry data: {0}")]
    Io(#[from] io::Error),
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The archive opened fine but nothing usable was left after filtering.
#[derive(Debug, Error)]
#[error("No valid files found in archive")]
pub struct EmptyArchiveError;

/// Failure of a whole extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Empty(#[from] EmptyArchiveError),
    #[error("Extraction timed out after {0:?}")]
    TimedOut(Duration),
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
