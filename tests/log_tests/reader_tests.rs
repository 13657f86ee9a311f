//! Tests for the random-access reader
//!
//! These tests verify:
//! - Locations resolve back to fully validated entries
//! - Each corruption sub-kind is reported with the offending location
//! - A corrupt entry never poisons reads of unrelated locations
//! - Handle caching and idempotent close

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use caskette::{CaskError, Config, CorruptionKind, Entry, Location, LogReader, LogWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::new(temp_dir.path());
    (temp_dir, config)
}

fn write_one(config: &Config, key: &str, value: &[u8], timestamp: u64) -> Location {
    let mut writer = LogWriter::open(config.clone()).unwrap();
    let location = writer
        .write_entry(Entry::with_timestamp(key, value, timestamp))
        .unwrap();
    writer.close().unwrap();
    location
}

fn corruption_kind(error: CaskError) -> (CorruptionKind, u32, u64) {
    match error {
        CaskError::Corruption {
            kind,
            file_id,
            offset,
        } => (kind, file_id, offset),
        other => panic!("expected corruption error, got {other:?}"),
    }
}

// =============================================================================
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_hello_world() {
    let (_temp, config) = setup();

    let location = write_one(&config, "hello", b"world", 1672531200);
    assert_eq!(location, Location::new(0, 0, 30, 1672531200));

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    let entry = reader.read_entry(&location).unwrap();

    assert_eq!(entry.key, "hello");
    assert_eq!(entry.value, b"world");
    assert_eq!(entry.timestamp, 1672531200);
    assert!(entry.verify());
}

#[test]
fn test_read_value_convenience() {
    let (_temp, config) = setup();

    let location = write_one(&config, "k", b"just the value", 1);

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    assert_eq!(reader.read_value(&location).unwrap(), b"just the value");
}

#[test]
fn test_read_entries_in_any_order() {
    let (_temp, config) = setup();

    let mut writer = LogWriter::open(config.clone()).unwrap();
    let locations: Vec<Location> = (0..10)
        .map(|i| {
            writer
                .write_entry(Entry::with_timestamp(
                    format!("key{i}"),
                    format!("value{i}").into_bytes(),
                    i,
                ))
                .unwrap()
        })
        .collect();
    writer.close().unwrap();

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    for i in (0..10).rev() {
        let entry = reader.read_entry(&locations[i]).unwrap();
        assert_eq!(entry.key, format!("key{i}"));
        assert_eq!(entry.value, format!("value{i}").into_bytes());
    }
}

// =============================================================================
// Missing File Tests
// =============================================================================

#[test]
fn test_open_missing_directory() {
    let temp = TempDir::new().unwrap();
    let result = LogReader::open(temp.path().join("does_not_exist"));
    assert!(matches!(result.unwrap_err(), CaskError::NotFound { .. }));
}

#[test]
fn test_read_missing_data_file() {
    let (_temp, config) = setup();
    write_one(&config, "k", b"v", 1);

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    let bogus = Location::new(7, 0, 30, 1);

    let result = reader.read_entry(&bogus);
    assert!(matches!(result.unwrap_err(), CaskError::NotFound { .. }));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_flipped_checksum_detected_and_isolated() {
    let (temp, config) = setup();

    let mut writer = LogWriter::open(config.clone()).unwrap();
    let first = writer
        .write_entry(Entry::with_timestamp("first", b"aaaa".to_vec(), 1))
        .unwrap();
    let second = writer
        .write_entry(Entry::with_timestamp("second", b"bbbb".to_vec(), 2))
        .unwrap();
    writer.close().unwrap();

    // Flip the stored checksum bytes of the first entry
    let path = temp.path().join("data_0.dat");
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(first.offset)).unwrap();
    file.write_all(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
    file.sync_all().unwrap();

    let mut reader = LogReader::open(&config.data_dir).unwrap();

    let (kind, file_id, offset) = corruption_kind(reader.read_entry(&first).unwrap_err());
    assert!(matches!(kind, CorruptionKind::ChecksumMismatch { .. }));
    assert_eq!((file_id, offset), (0, first.offset));

    // The unrelated entry in the same file still reads fine
    let entry = reader.read_entry(&second).unwrap();
    assert_eq!(entry.key, "second");
    assert_eq!(entry.value, b"bbbb");
}

#[test]
fn test_location_size_cross_check() {
    let (_temp, config) = setup();

    let good = write_one(&config, "hello", b"world", 1);
    let lying = Location::new(good.file_id, good.offset, good.size - 1, good.timestamp);

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    let (kind, _, _) = corruption_kind(reader.read_entry(&lying).unwrap_err());
    assert_eq!(
        kind,
        CorruptionKind::SizeMismatch {
            expected: 29,
            actual: 30,
        }
    );
}

#[test]
fn test_corrupted_size_fields_detected() {
    // Overwrite the key_size field (header bytes 12..16) of a stored
    // entry. The declared total no longer matches the location's size
    // and must surface as corruption, however large the bogus size is.
    let (temp, config) = setup();
    let location = write_one(&config, "hello", b"world", 1);

    let path = temp.path().join("data_0.dat");
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(location.offset + 12)).unwrap();
    file.write_all(&[0xFF; 4]).unwrap();
    file.sync_all().unwrap();

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    let (kind, file_id, offset) = corruption_kind(reader.read_entry(&location).unwrap_err());
    assert_eq!(
        kind,
        CorruptionKind::SizeMismatch {
            expected: 30,
            actual: 20 + u64::from(u32::MAX) + 5,
        }
    );
    assert_eq!((file_id, offset), (0, location.offset));

    // The reader stays usable after the failed read
    assert!(matches!(
        reader.read_entry(&location).unwrap_err(),
        caskette::CaskError::Corruption { .. }
    ));
}

#[test]
fn test_truncation_error_kinds() {
    // hello/world entry: header ends at 20, key at 25, value at 30
    let cases = [
        (10, CorruptionKind::IncompleteHeader),
        (
            22,
            CorruptionKind::IncompleteKey {
                expected: 5,
                actual: 2,
            },
        ),
        (
            27,
            CorruptionKind::IncompleteValue {
                expected: 5,
                actual: 2,
            },
        ),
    ];

    for (truncate_to, expected_kind) in cases {
        let (temp, config) = setup();
        let location = write_one(&config, "hello", b"world", 1);

        let path = temp.path().join("data_0.dat");
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(truncate_to).unwrap();
        file.sync_all().unwrap();

        let mut reader = LogReader::open(&config.data_dir).unwrap();
        let (kind, file_id, offset) = corruption_kind(reader.read_entry(&location).unwrap_err());
        assert_eq!(kind, expected_kind);
        assert_eq!((file_id, offset), (0, 0));
    }
}

#[test]
fn test_corruption_does_not_poison_reader() {
    let (temp, config) = setup();

    let mut writer = LogWriter::open(config.clone()).unwrap();
    let first = writer
        .write_entry(Entry::with_timestamp("a", b"1".to_vec(), 1))
        .unwrap();
    let second = writer
        .write_entry(Entry::with_timestamp("b", b"2".to_vec(), 2))
        .unwrap();
    writer.close().unwrap();

    // Truncate away the second entry entirely
    let path = temp.path().join("data_0.dat");
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(first.size as u64).unwrap();

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    assert!(reader.read_entry(&second).is_err());

    // Same reader, same handle, unrelated location still works
    let entry = reader.read_entry(&first).unwrap();
    assert_eq!(entry.key, "a");
}

// =============================================================================
// Handle Cache Tests
// =============================================================================

#[test]
fn test_handles_cached_per_file() {
    let (_temp, config) = setup();

    let mut writer = LogWriter::open(
        Config::builder()
            .data_dir(&config.data_dir)
            .max_file_size(84)
            .build(),
    )
    .unwrap();
    let mut locations = Vec::new();
    for i in 0..3 {
        locations.push(
            writer
                .write_entry(Entry::with_timestamp("k", vec![i as u8; 63], 1))
                .unwrap(),
        );
    }
    writer.close().unwrap();

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    assert_eq!(reader.stats().open_handles, 0);

    for location in &locations {
        reader.read_entry(location).unwrap();
    }
    assert_eq!(reader.stats().open_handles, 3);

    // Re-reading reuses the cached handles
    reader.read_entry(&locations[0]).unwrap();
    assert_eq!(reader.stats().open_handles, 3);
}

#[test]
fn test_close_is_idempotent() {
    let (_temp, config) = setup();

    let location = write_one(&config, "k", b"v", 1);

    let mut reader = LogReader::open(&config.data_dir).unwrap();
    reader.read_entry(&location).unwrap();
    assert_eq!(reader.stats().open_handles, 1);

    reader.close();
    reader.close();
    assert_eq!(reader.stats().open_handles, 0);

    // Reads after close reopen handles on demand
    assert_eq!(reader.read_value(&location).unwrap(), b"v");
}
