//! Configuration for caskette
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

/// Default cap on a single data file: 1 GiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Configuration for a log instance
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the numbered data files.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── data_0.dat
    ///     ├── data_1.dat
    ///     └── ...
    pub data_dir: PathBuf,

    /// Size bound per data file (in bytes). The writer rotates to a new
    /// file once appending would push the active file past this bound.
    pub max_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./caskette_data"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Config {
    /// Config for `data_dir` with the default file size bound
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the data file with the given id
    pub fn data_file_path(&self, file_id: u32) -> PathBuf {
        data_file_path(&self.data_dir, file_id)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the per-file size bound (in bytes)
    pub fn max_file_size(mut self, size: u64) -> Self {
        self.config.max_file_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Naming convention for data files: `data_<id>.dat`.
///
/// Writer and reader must agree on this; both go through these helpers.
pub(crate) fn data_file_path(data_dir: &Path, file_id: u32) -> PathBuf {
    data_dir.join(format!("data_{file_id}.dat"))
}

/// Parse a file id back out of a data file name. Returns `None` for
/// anything that does not match the convention.
pub(crate) fn parse_data_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("data_")?
        .strip_suffix(".dat")?
        .parse()
        .ok()
}
