use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::requests::DeviceAddRequest;
use crate::response::DeviceInfoResponse;
use crate::store::{
    Bucket, Entry, IdSet, RegistryKey, Result, StoreError, Transaction, WriteTxn, entry,
};

use super::brick::BrickEntry;
use super::generate_id;

/// Device capacity in KiB. `used + free == total` after every allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSize {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub node_id: String,
    pub storage: StorageSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub info: DeviceInfo,
    pub bricks: IdSet,
}

impl Entry for DeviceEntry {
    const BUCKET: Bucket = Bucket::Device;

    fn id(&self) -> &str {
        &self.info.id
    }
}

impl DeviceEntry {
    /// New device with all of its reported capacity free.
    pub fn from_request(req: &DeviceAddRequest) -> Self {
        Self {
            info: DeviceInfo {
                id: generate_id(),
                name: req.name.clone(),
                node_id: req.node_id.clone(),
                storage: StorageSize {
                    total: req.size_kib,
                    free: req.size_kib,
                    used: 0,
                },
            },
            bricks: IdSet::new(),
        }
    }

    pub fn load(tx: &impl Transaction, id: &str) -> Result<Self> {
        entry::load(tx, id)
    }

    pub fn save(&self, tx: &WriteTxn) -> Result<()> {
        entry::save(tx, self)
    }

    fn registry_key(&self) -> RegistryKey {
        RegistryKey::device(&self.info.node_id, &self.info.name)
    }

    /// Claim the device name on its node.
    pub fn register(&self, tx: &WriteTxn) -> Result<()> {
        entry::register(tx, self, &self.registry_key())
    }

    pub fn deregister(&self, tx: &WriteTxn) -> Result<()> {
        entry::deregister(tx, self, &self.registry_key())
    }

    pub fn brick_add(&mut self, id: impl Into<String>) -> bool {
        self.bricks.insert(id)
    }

    pub fn brick_delete(&mut self, id: &str) -> bool {
        self.bricks.remove(id)
    }

    /// Move `amount` KiB from free to used.
    pub fn storage_allocate(&mut self, amount: u64) -> Result<()> {
        let storage = &mut self.info.storage;
        if amount > storage.free {
            return Err(StoreError::InvalidArgument(format!(
                "device {} has {} KiB free, {} KiB requested",
                self.info.id, storage.free, amount
            )));
        }
        storage.free -= amount;
        storage.used += amount;
        Ok(())
    }

    /// Return `amount` KiB to the free pool. Never frees more than is used.
    pub fn storage_free(&mut self, amount: u64) {
        let storage = &mut self.info.storage;
        let amount = amount.min(storage.used);
        storage.used -= amount;
        storage.free += amount;
    }

    pub fn is_delete_ok(&self) -> bool {
        self.bricks.is_empty()
    }

    /// Remove the device and release its name.
    /// Refused with `Conflict` while bricks live on it.
    pub fn delete(&self, tx: &WriteTxn) -> Result<()> {
        if !self.is_delete_ok() {
            warn!(
                id = %self.info.id,
                bricks = self.bricks.len(),
                "Unable to delete device because it contains bricks"
            );
            return Err(StoreError::Conflict(format!(
                "device {} still has {} brick(s)",
                self.info.id,
                self.bricks.len()
            )));
        }
        self.deregister(tx)?;
        entry::delete(tx, self)
    }

    pub fn info_response(&self, tx: &impl Transaction) -> Result<DeviceInfoResponse> {
        let bricks = self
            .bricks
            .iter()
            .map(|id| BrickEntry::load(tx, id).map(|brick| brick.info))
            .collect::<Result<Vec<_>>>()?;

        Ok(DeviceInfoResponse {
            id: self.info.id.clone(),
            name: self.info.name.clone(),
            node_id: self.info.node_id.clone(),
            storage: self.info.storage,
            bricks,
        })
    }
}
