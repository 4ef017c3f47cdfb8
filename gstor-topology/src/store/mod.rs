//! Transactional entity store.
//!
//! # Architecture
//!
//! ```text
//! topology.rs / entities → entry::{load, save, delete, register, deregister}
//!                                  ↓
//!                          WriteTxn / ReadTxn            // one per request
//!                                  ↓
//!                          Db (redb::Database)           // opened once
//! ```
//!
//! Each entity kind lives in its own bucket (`id → bincode bytes`). The
//! registry bucket maps role-prefixed names to the id that owns them.
//!
//! # Usage
//!
//! ```ignore
//! use gstor_topology::store::{Db, entry};
//! use gstor_topology::entities::ClusterEntry;
//!
//! let db = Db::open_path("/var/lib/gstor/topology")?;
//! let cluster = ClusterEntry::new();
//! db.update(|tx| entry::save(tx, &cluster))?;
//! let loaded: ClusterEntry = db.view(|tx| entry::load(tx, &cluster.info.id))?;
//! ```

pub mod codec;
mod db;
pub mod entry;
mod error;
mod idset;
pub mod registry;

pub use db::{Bucket, Db, ReadTxn, Transaction, WriteTxn};
pub use entry::Entry;
pub use error::{Result, StoreError};
pub use idset::IdSet;
pub use registry::{RegistryKey, Role};
