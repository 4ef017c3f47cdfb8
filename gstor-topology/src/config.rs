//! Store configuration.

use std::path::{Path, PathBuf};

/// File name of the database inside `data_dir`.
pub const DB_FILENAME: &str = "topology.redb";

/// How hard a commit pushes data to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// fsync on every commit
    #[default]
    Immediate,

    /// Commits become durable with a later immediate commit
    Eventual,

    /// Nothing is synced (tests, throwaway stores)
    None,
}

impl From<SyncMode> for redb::Durability {
    fn from(mode: SyncMode) -> Self {
        match mode {
            SyncMode::Immediate => redb::Durability::Immediate,
            SyncMode::Eventual => redb::Durability::Eventual,
            SyncMode::None => redb::Durability::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the database file.
    pub data_dir: PathBuf,

    /// Durability applied to every write transaction.
    pub sync_mode: SyncMode,

    /// Page cache size handed to redb.
    pub cache_size_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/gstor/topology"),
            sync_mode: SyncMode::Immediate,
            cache_size_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size_bytes = bytes;
        self
    }

    /// Full path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
