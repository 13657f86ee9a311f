//! Durable record log
//!
//! The append-only storage layer of a Bitcask-style store: numbered data
//! files holding back-to-back serialized entries.
//!
//! ## Responsibilities
//! - Self-describing binary record format with CRC32 checksums
//! - Single append writer with size-bounded file rotation
//! - Random-access reads by explicit byte location
//! - Corruption detection on every read, never silent truncation
//!
//! ## File Format
//! ```text
//! data_<id>.dat
//! ┌──────────────────────────────────────────────────────┐
//! │ Entry 1                                              │
//! │ ┌───────┬─────────────┬───────┬───────┬─────┬──────┐ │
//! │ │CRC (4)│Timestamp (8)│KSz (4)│VSz (4)│ Key │Value │ │
//! │ └───────┴─────────────┴───────┴───────┴─────┴──────┘ │
//! ├──────────────────────────────────────────────────────┤
//! │ Entry 2                                              │
//! │ ...                                                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! What this layer does not do: key lookup (an external keydir maps keys
//! to [`Location`]s), compaction, or recovery of damaged file tails.

mod entry;
mod reader;
mod writer;

pub use entry::{Entry, Location, HEADER_SIZE};
pub use reader::{LogReader, ReaderStats};
pub use writer::{LogWriter, WriterStats};

use std::io;
use std::path::Path;

use crate::error::CaskError;

/// Shorthand for the I/O-failure error both file owners report
pub(crate) fn durability(operation: &'static str, path: &Path, source: io::Error) -> CaskError {
    CaskError::Durability {
        operation,
        path: path.to_path_buf(),
        source,
    }
}
