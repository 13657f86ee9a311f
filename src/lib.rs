//! # caskette
//!
//! The durable record-level log underlying a Bitcask-style key-value
//! store:
//! - Append-only binary log with per-entry CRC32 integrity checking
//! - Size-bounded data file rotation with crash-safe restart
//! - Random-access retrieval by explicit byte location
//! - Structured corruption detection for every on-disk failure mode
//!
//! ## Architecture Overview
//!
//! ```text
//!            caller / external keydir
//!          ┌────────────┬─────────────┐
//!          │ Entry      │ Location    │
//!          ▼            │             ▼
//!   ┌─────────────┐     │      ┌─────────────┐
//!   │  LogWriter  │─────┘      │  LogReader  │
//!   │  (append,   │            │ (seek+read, │
//!   │   rotate)   │            │  validate)  │
//!   └──────┬──────┘            └──────┬──────┘
//!          │        Entry codec       │
//!          ▼   (encode/decode/CRC32)  ▼
//!   ┌─────────────────────────────────────────┐
//!   │   data_0.dat  data_1.dat  data_2.dat …  │
//!   └─────────────────────────────────────────┘
//! ```
//!
//! Key lookup, compaction and any network or CLI surface belong to the
//! store built on top of this crate.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod log;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{CaskError, CorruptionKind, Result};
pub use log::{Entry, Location, LogReader, LogWriter, HEADER_SIZE};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of caskette
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
