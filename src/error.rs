//! Error types for caskette
//!
//! One tagged error type for the whole log layer. Every variant carries
//! enough structured context (path, operation, location) that a caller
//! can react without parsing the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for log operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("cannot create or access data directory {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Missing Files
    // -------------------------------------------------------------------------
    #[error("data file not found: {path}")]
    NotFound { path: PathBuf },

    // -------------------------------------------------------------------------
    // Corruption Errors
    // -------------------------------------------------------------------------
    #[error("corrupted entry in file {file_id} at offset {offset}: {kind}")]
    Corruption {
        kind: CorruptionKind,
        file_id: u32,
        offset: u64,
    },

    // -------------------------------------------------------------------------
    // Durability Errors
    // -------------------------------------------------------------------------
    #[error("{operation} failed on {path}: {source}")]
    Durability {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The specific way a stored entry failed validation.
///
/// Produced by the codec, which has no notion of files; the reader wraps
/// it into [`CaskError::Corruption`] together with the offending location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptionKind {
    #[error("incomplete header")]
    IncompleteHeader,

    /// `actual` is u64: a corrupted header can declare sizes whose sum
    /// exceeds any real entry, and must still be reported, not wrapped.
    #[error("size mismatch: expected {expected}, calculated {actual}")]
    SizeMismatch { expected: u32, actual: u64 },

    #[error("incomplete key data: expected {expected} bytes, got {actual}")]
    IncompleteKey { expected: u32, actual: u32 },

    #[error("incomplete value data: expected {expected} bytes, got {actual}")]
    IncompleteValue { expected: u32, actual: u32 },

    #[error("key is not valid UTF-8")]
    InvalidKeyUtf8,

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

impl CorruptionKind {
    /// Attach the offending location, turning the codec-level kind into
    /// a full error.
    pub fn at(self, file_id: u32, offset: u64) -> CaskError {
        CaskError::Corruption {
            kind: self,
            file_id,
            offset,
        }
    }
}
