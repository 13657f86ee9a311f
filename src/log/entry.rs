//! Log entry codec
//!
//! Defines the on-disk record format and the pure encode/decode/checksum
//! logic over it. No I/O happens here; the writer and reader own the files.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::CorruptionKind;

/// Fixed size of the serialized entry header:
/// checksum (4) + timestamp (8) + key_size (4) + value_size (4)
pub const HEADER_SIZE: usize = 20;

/// A single key-value record as stored on disk.
///
/// Serialized layout, all integers big-endian:
///
/// ```text
/// ┌────────────┬─────────────┬────────────┬──────────────┬───────┬─────────┐
/// │ checksum:4 │ timestamp:8 │ key_size:4 │ value_size:4 │ key.. │ value.. │
/// └────────────┴─────────────┴────────────┴──────────────┴───────┴─────────┘
/// ```
///
/// The checksum is a CRC32 over every serialized field except itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// CRC32 over timestamp ‖ key_size ‖ value_size ‖ key ‖ value.
    /// Zero until [`Entry::finalize`] runs; the writer finalizes before
    /// any bytes hit disk.
    pub checksum: u32,

    /// Unix timestamp (seconds) when the entry was created
    pub timestamp: u64,

    /// Byte length of the UTF-8 encoded key
    pub key_size: u32,

    /// Byte length of the value
    pub value_size: u32,

    /// The key
    pub key: String,

    /// The value, raw bytes, no interpretation
    pub value: Vec<u8>,
}

impl Entry {
    /// Create an entry stamped with the current time. Sizes are derived
    /// from the key and value; the checksum stays unset until finalized.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::with_timestamp(key, value, unix_timestamp())
    }

    /// Create an entry with an explicit timestamp
    pub fn with_timestamp(
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
        timestamp: u64,
    ) -> Self {
        let key = key.into();
        let value = value.into();
        Self {
            checksum: 0,
            timestamp,
            key_size: key.len() as u32,
            value_size: value.len() as u32,
            key,
            value,
        }
    }

    /// Total serialized size: header plus key plus value bytes
    pub fn total_size(&self) -> u32 {
        HEADER_SIZE as u32 + self.key.len() as u32 + self.value.len() as u32
    }

    /// Check that the stored sizes match the actual key/value lengths.
    /// Useful for catching construction bugs before anything hits disk.
    pub fn sizes_consistent(&self) -> bool {
        self.key_size as usize == self.key.len() && self.value_size as usize == self.value.len()
    }

    /// CRC32 over everything except the checksum field itself
    pub fn compute_checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.timestamp.to_be_bytes());
        hasher.update(&self.key_size.to_be_bytes());
        hasher.update(&self.value_size.to_be_bytes());
        hasher.update(self.key.as_bytes());
        hasher.update(&self.value);
        hasher.finalize()
    }

    /// Compute and store the checksum
    pub fn finalize(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// True if the stored checksum matches the recomputed one
    pub fn verify(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Serialize to the on-disk format
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.total_size() as usize);
        buf.put_u32(self.checksum);
        buf.put_u64(self.timestamp);
        buf.put_u32(self.key_size);
        buf.put_u32(self.value_size);
        buf.put_slice(self.key.as_bytes());
        buf.put_slice(&self.value);
        buf.freeze()
    }

    /// Parse and validate an entry from its serialized form.
    ///
    /// Validation order: header present, declared size against
    /// `expected_size` (when the caller knows one, e.g. from a Location),
    /// key and value payload present, key UTF-8, checksum. The first
    /// failing stage is reported; nothing is truncated or defaulted.
    pub fn decode(buf: &[u8], expected_size: Option<u32>) -> Result<Self, CorruptionKind> {
        if buf.len() < HEADER_SIZE {
            return Err(CorruptionKind::IncompleteHeader);
        }

        let mut header = &buf[..HEADER_SIZE];
        let checksum = header.get_u32();
        let timestamp = header.get_u64();
        let key_size = header.get_u32();
        let value_size = header.get_u32();

        // Widened so hostile header sizes cannot overflow the sum.
        let declared_size = HEADER_SIZE as u64 + u64::from(key_size) + u64::from(value_size);
        if let Some(expected) = expected_size {
            if declared_size != u64::from(expected) {
                return Err(CorruptionKind::SizeMismatch {
                    expected,
                    actual: declared_size,
                });
            }
        }

        let payload = &buf[HEADER_SIZE..];
        if payload.len() < key_size as usize {
            return Err(CorruptionKind::IncompleteKey {
                expected: key_size,
                actual: payload.len() as u32,
            });
        }
        let (key_bytes, rest) = payload.split_at(key_size as usize);
        if rest.len() < value_size as usize {
            return Err(CorruptionKind::IncompleteValue {
                expected: value_size,
                actual: rest.len() as u32,
            });
        }

        let key = std::str::from_utf8(key_bytes)
            .map_err(|_| CorruptionKind::InvalidKeyUtf8)?
            .to_owned();
        let value = rest[..value_size as usize].to_vec();

        let entry = Self {
            checksum,
            timestamp,
            key_size,
            value_size,
            key,
            value,
        };

        let computed = entry.compute_checksum();
        if computed != entry.checksum {
            return Err(CorruptionKind::ChecksumMismatch {
                stored: entry.checksum,
                computed,
            });
        }

        Ok(entry)
    }
}

/// Addressing handle for one stored entry, handed out by the writer and
/// resolved by the reader. This layer never persists Locations itself;
/// the serde derives exist so an external index (keydir) can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Numeric id of the data file containing the entry
    pub file_id: u32,

    /// Byte offset of the entry's first byte within that file
    pub offset: u64,

    /// Total serialized size of the entry, used as a read-time cross-check
    pub size: u32,

    /// Copy of the entry's timestamp, for convenience
    pub timestamp: u64,
}

impl Location {
    pub fn new(file_id: u32, offset: u64, size: u32, timestamp: u64) -> Self {
        Self {
            file_id,
            offset,
            size,
            timestamp,
        }
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
