//! Shared helpers for unit tests.

use tempfile::TempDir;

use crate::config::{Config, SyncMode};
use crate::store::Db;

/// Fresh database in a temporary directory. Keep the `TempDir` alive for
/// as long as the database is used.
pub(crate) fn open_db() -> (TempDir, Db) {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path()).with_sync_mode(SyncMode::None);
    let db = Db::open(&config).unwrap();
    (dir, db)
}
