//! Append writer
//!
//! Sole owner of the currently growing data file. Serializes entries,
//! rotates to a new file when the size bound would be exceeded, and hands
//! out a [`Location`] for every durable write.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{data_file_path, parse_data_file_name, Config};
use crate::error::{CaskError, Result};
use super::{durability, Entry, Location};

/// Appends entries to numbered data files with automatic rotation.
///
/// Lifecycle: [`LogWriter::open`] scans the data directory and either
/// resumes the highest-numbered file or starts a fresh one, so a restart
/// never loses or overwrites durable bytes. The writer then stays active,
/// rotating internally on overflow, until [`LogWriter::close`] consumes
/// it. A closed writer cannot be revived; open a new one.
///
/// Exactly one writer may be active per data directory; that invariant
/// is the caller's to uphold.
pub struct LogWriter {
    config: Config,
    active_file_id: u32,
    active_handle: File,
    current_offset: u64,
}

/// Snapshot of the writer's position, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterStats {
    pub active_file_id: u32,
    pub current_offset: u64,
    pub max_file_size: u64,
    pub bytes_remaining: u64,
}

impl LogWriter {
    /// Open a writer over the directory named by `config`.
    ///
    /// Creates the directory if needed, then picks the active file:
    /// - no data files → file 0, offset 0;
    /// - highest-numbered file still below the size bound → resume it at
    ///   `offset == file size`;
    /// - highest-numbered file at or past the bound → start the next id
    ///   at offset 0.
    ///
    /// File ids need not be contiguous; only the maximum matters.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|source| CaskError::Config {
            path: config.data_dir.clone(),
            source,
        })?;

        let (active_file_id, current_offset) = match highest_file_id(&config)? {
            Some(last_id) => {
                let path = config.data_file_path(last_id);
                let size = fs::metadata(&path)
                    .map_err(|source| durability("stat", &path, source))?
                    .len();
                if size < config.max_file_size {
                    debug!(file_id = last_id, offset = size, "resuming active data file");
                    (last_id, size)
                } else {
                    debug!(file_id = last_id + 1, "previous file full, starting new data file");
                    (last_id + 1, 0)
                }
            }
            None => {
                debug!("empty data directory, starting at file 0");
                (0, 0)
            }
        };

        let active_handle = open_for_append(&config, active_file_id)?;

        Ok(Self {
            config,
            active_file_id,
            active_handle,
            current_offset,
        })
    }

    /// Append an entry and return where it landed.
    ///
    /// Finalizes the entry's checksum, rotates first if the accumulated
    /// bytes would exceed the file size bound, writes the full serialized
    /// form and flushes it to disk. The returned [`Location`] points at
    /// the offset *before* the write.
    ///
    /// A single entry larger than `max_file_size` is never split: it is
    /// written whole into one file. Rotation guards against accumulated
    /// overflow only.
    pub fn write_entry(&mut self, mut entry: Entry) -> Result<Location> {
        let entry_size = entry.total_size();
        if self.should_rotate(entry_size) {
            self.rotate()?;
        }

        entry.finalize();
        let write_offset = self.current_offset;
        let buf = entry.encode();

        let path = self.active_path();
        self.active_handle
            .write_all(&buf)
            .map_err(|source| durability("write", &path, source))?;
        self.active_handle
            .sync_data()
            .map_err(|source| durability("flush", &path, source))?;

        self.current_offset += buf.len() as u64;

        Ok(Location::new(
            self.active_file_id,
            write_offset,
            entry_size,
            entry.timestamp,
        ))
    }

    /// Force outstanding bytes of the active file to disk
    pub fn sync(&mut self) -> Result<()> {
        let path = self.active_path();
        self.active_handle
            .sync_data()
            .map_err(|source| durability("flush", &path, source))
    }

    /// Id of the file currently being appended to
    pub fn active_file_id(&self) -> u32 {
        self.active_file_id
    }

    /// Next write position within the active file
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Snapshot of the writer's position
    pub fn stats(&self) -> WriterStats {
        WriterStats {
            active_file_id: self.active_file_id,
            current_offset: self.current_offset,
            max_file_size: self.config.max_file_size,
            bytes_remaining: self.config.max_file_size.saturating_sub(self.current_offset),
        }
    }

    /// Flush and shut down. Consumes the writer: the closed state is
    /// terminal, reopen with [`LogWriter::open`] instead.
    pub fn close(mut self) -> Result<()> {
        self.sync()
    }

    fn should_rotate(&self, entry_size: u32) -> bool {
        // An empty active file takes any entry, however large.
        self.current_offset > 0
            && self.current_offset + entry_size as u64 > self.config.max_file_size
    }

    fn rotate(&mut self) -> Result<()> {
        let next_id = self.active_file_id + 1;
        debug!(
            from = self.active_file_id,
            to = next_id,
            offset = self.current_offset,
            "rotating to new data file"
        );

        // Old handle drops (and closes) once the new one is in place.
        self.active_handle = open_for_append(&self.config, next_id)?;
        self.active_file_id = next_id;
        self.current_offset = 0;
        Ok(())
    }

    fn active_path(&self) -> PathBuf {
        self.config.data_file_path(self.active_file_id)
    }
}

/// Highest data file id present in the directory, if any. Non-matching
/// file names are skipped rather than treated as errors.
fn highest_file_id(config: &Config) -> Result<Option<u32>> {
    let dir = fs::read_dir(&config.data_dir).map_err(|source| CaskError::Config {
        path: config.data_dir.clone(),
        source,
    })?;

    let mut max_id = None;
    for dir_entry in dir {
        let dir_entry = dir_entry.map_err(|source| CaskError::Config {
            path: config.data_dir.clone(),
            source,
        })?;
        if let Some(id) = dir_entry
            .file_name()
            .to_str()
            .and_then(parse_data_file_name)
        {
            max_id = Some(max_id.map_or(id, |m: u32| m.max(id)));
        }
    }
    Ok(max_id)
}

fn open_for_append(config: &Config, file_id: u32) -> Result<File> {
    let path = data_file_path(&config.data_dir, file_id);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| durability("open", &path, source))
}
