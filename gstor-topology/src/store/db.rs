use redb::{Database, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, SyncMode};

use super::error::Result;

const TABLE_CLUSTER: TableDefinition<&str, &[u8]> = TableDefinition::new("CLUSTER");
const TABLE_NODE: TableDefinition<&str, &[u8]> = TableDefinition::new("NODE");
const TABLE_DEVICE: TableDefinition<&str, &[u8]> = TableDefinition::new("DEVICE");
const TABLE_VOLUME: TableDefinition<&str, &[u8]> = TableDefinition::new("VOLUME");
const TABLE_BRICK: TableDefinition<&str, &[u8]> = TableDefinition::new("BRICK");
const TABLE_REGISTRY: TableDefinition<&str, &[u8]> = TableDefinition::new("REGISTRY");

/// A namespace in the store. Every bucket is one redb table keyed by string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Cluster,
    Node,
    Device,
    Volume,
    Brick,
    Registry,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::Cluster,
        Bucket::Node,
        Bucket::Device,
        Bucket::Volume,
        Bucket::Brick,
        Bucket::Registry,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Bucket::Cluster => "cluster",
            Bucket::Node => "node",
            Bucket::Device => "device",
            Bucket::Volume => "volume",
            Bucket::Brick => "brick",
            Bucket::Registry => "registry",
        }
    }

    fn table(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        match self {
            Bucket::Cluster => TABLE_CLUSTER,
            Bucket::Node => TABLE_NODE,
            Bucket::Device => TABLE_DEVICE,
            Bucket::Volume => TABLE_VOLUME,
            Bucket::Brick => TABLE_BRICK,
            Bucket::Registry => TABLE_REGISTRY,
        }
    }
}

/// Read access shared by read-only and read-write transactions.
pub trait Transaction {
    fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>>;

    /// All keys of a bucket in ascending order.
    fn keys(&self, bucket: Bucket) -> Result<Vec<String>>;
}

/// Process-wide handle on the topology database.
///
/// Opened once at startup and shared by reference (or `Arc`) with every
/// request. Writers are serialized by redb; readers work on a snapshot and
/// never wait for a writer.
pub struct Db {
    db: Database,
    path: PathBuf,
    sync_mode: SyncMode,
}

impl Db {
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        let path = config.db_path();

        let db = Database::builder()
            .set_cache_size(config.cache_size_bytes)
            .create(&path)?;

        // Buckets must exist before any read transaction opens them
        let txn = db.begin_write()?;
        for bucket in Bucket::ALL {
            txn.open_table(bucket.table())?;
        }
        txn.commit()?;

        info!(path = %path.display(), "Opened topology store");

        Ok(Self {
            db,
            path,
            sync_mode: config.sync_mode,
        })
    }

    /// Open with default settings under `data_dir`.
    pub fn open_path(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(&Config::new(data_dir.as_ref()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin_write(&self) -> Result<WriteTxn> {
        let mut inner = self.db.begin_write()?;
        inner.set_durability(self.sync_mode.into());
        Ok(WriteTxn { inner })
    }

    pub fn begin_read(&self) -> Result<ReadTxn> {
        Ok(ReadTxn {
            inner: self.db.begin_read()?,
        })
    }

    /// Run `f` in a write transaction.
    ///
    /// Commits when `f` returns `Ok`. Any error aborts the whole transaction,
    /// so nothing `f` wrote before failing is kept.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&WriteTxn) -> Result<T>,
    {
        let txn = self.begin_write()?;
        match f(&txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Aborting write transaction");
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "Failed to abort write transaction");
                }
                Err(err)
            }
        }
    }

    /// Run `f` against a read-only snapshot.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTxn) -> Result<T>,
    {
        let txn = self.begin_read()?;
        f(&txn)
    }
}

/// Read-only snapshot of the store.
pub struct ReadTxn {
    inner: ReadTransaction,
}

impl Transaction for ReadTxn {
    fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>> {
        let table = self.inner.open_table(bucket.table())?;
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn keys(&self, bucket: Bucket) -> Result<Vec<String>> {
        let table = self.inner.open_table(bucket.table())?;
        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

/// Read-write transaction. Dropping it without `commit` discards every write.
pub struct WriteTxn {
    inner: WriteTransaction,
}

impl WriteTxn {
    /// Write `value` under `key`, replacing any previous value.
    pub fn put(&self, bucket: Bucket, key: &str, value: &[u8]) -> Result<()> {
        let mut table = self.inner.open_table(bucket.table())?;
        table.insert(key, value)?;
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, bucket: Bucket, key: &str) -> Result<bool> {
        let mut table = self.inner.open_table(bucket.table())?;
        let existed = table.remove(key)?.is_some();
        Ok(existed)
    }

    pub fn commit(self) -> Result<()> {
        self.inner.commit()?;
        Ok(())
    }

    pub fn abort(self) -> Result<()> {
        self.inner.abort()?;
        Ok(())
    }
}

impl Transaction for WriteTxn {
    fn get(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>> {
        let table = self.inner.open_table(bucket.table())?;
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn keys(&self, bucket: Bucket) -> Result<Vec<String>> {
        let table = self.inner.open_table(bucket.table())?;
        let mut keys = Vec::new();
        for item in table.iter()? {
            let (key, _) = item?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
