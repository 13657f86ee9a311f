//! Random-access reader
//!
//! Resolves Locations back into entries. Keeps one read handle per data
//! file, opened lazily and held until [`LogReader::close`]. Safe to use
//! alongside the single active writer: a Location only ever points at
//! bytes that were fully flushed before it was handed out.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::config::data_file_path;
use crate::error::{CaskError, Result};
use super::{durability, Entry, Location};

/// Reads entries from the data files of one store directory
#[derive(Debug)]
pub struct LogReader {
    data_dir: PathBuf,
    handles: HashMap<u32, File>,
}

/// Snapshot of the reader's handle cache, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderStats {
    pub open_handles: usize,
}

impl LogReader {
    /// Open a reader over an existing data directory
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.exists() {
            return Err(CaskError::NotFound { path: data_dir });
        }
        Ok(Self {
            data_dir,
            handles: HashMap::new(),
        })
    }

    /// Read and fully validate the entry at `location`.
    ///
    /// Every corruption the codec can detect is surfaced as a
    /// [`CaskError::Corruption`] carrying the sub-kind and the offending
    /// location. A failed read leaves the reader usable for other
    /// locations.
    pub fn read_entry(&mut self, location: &Location) -> Result<Entry> {
        let data_dir = self.data_dir.clone();
        let file = handle(&mut self.handles, &data_dir, location.file_id)?;
        let path = data_file_path(&data_dir, location.file_id);

        file.seek(SeekFrom::Start(location.offset))
            .map_err(|source| durability("seek", &path, source))?;

        // Read up to the expected size; a short read is not an I/O error
        // here, it shows up as an incomplete-data corruption from decode.
        let mut buf = vec![0u8; location.size as usize];
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => return Err(durability("read", &path, source)),
            }
        }
        buf.truncate(filled);

        Entry::decode(&buf, Some(location.size))
            .map_err(|kind| kind.at(location.file_id, location.offset))
    }

    /// Convenience: read only the value stored at `location`
    pub fn read_value(&mut self, location: &Location) -> Result<Vec<u8>> {
        Ok(self.read_entry(location)?.value)
    }

    /// Number of data files with an open cached handle
    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            open_handles: self.handles.len(),
        }
    }

    /// Drop all cached file handles. Idempotent; the reader can keep
    /// serving reads afterwards by reopening handles on demand.
    pub fn close(&mut self) {
        if !self.handles.is_empty() {
            debug!(handles = self.handles.len(), "closing cached data file handles");
        }
        self.handles.clear();
    }
}

/// Get or lazily open the read handle for `file_id`
fn handle<'a>(
    handles: &'a mut HashMap<u32, File>,
    data_dir: &std::path::Path,
    file_id: u32,
) -> Result<&'a mut File> {
    match handles.entry(file_id) {
        MapEntry::Occupied(slot) => Ok(slot.into_mut()),
        MapEntry::Vacant(slot) => {
            let path = data_file_path(data_dir, file_id);
            let file = File::open(&path).map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    CaskError::NotFound { path: path.clone() }
                } else {
                    durability("open", &path, source)
                }
            })?;
            trace!(file_id, "opened data file handle");
            Ok(slot.insert(file))
        }
    }
}
