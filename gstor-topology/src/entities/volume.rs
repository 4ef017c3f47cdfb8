use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::requests::VolumeCreateRequest;
use crate::response::VolumeInfoResponse;
use crate::store::{
    Bucket, Entry, IdSet, RegistryKey, Result, StoreError, Transaction, WriteTxn, entry,
};

use super::brick::BrickEntry;
use super::generate_id;

/// Replica count used when a request does not name one.
pub const DEFAULT_REPLICA: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub id: String,
    pub name: String,
    pub size_gib: u64,
    pub cluster_id: String,
    pub replica: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEntry {
    pub info: VolumeInfo,
    pub bricks: IdSet,
}

impl Entry for VolumeEntry {
    const BUCKET: Bucket = Bucket::Volume;

    fn id(&self) -> &str {
        &self.info.id
    }
}

impl VolumeEntry {
    pub fn from_request(req: &VolumeCreateRequest) -> Result<Self> {
        let replica = req.replica.unwrap_or(DEFAULT_REPLICA);
        if replica == 0 {
            return Err(StoreError::InvalidArgument(
                "replica count must be at least 1".into(),
            ));
        }
        if req.size_gib == 0 {
            return Err(StoreError::InvalidArgument(
                "volume size must be at least 1 GiB".into(),
            ));
        }

        let id = generate_id();
        let name = match &req.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("vol_{id}"),
        };

        Ok(Self {
            info: VolumeInfo {
                id,
                name,
                size_gib: req.size_gib,
                cluster_id: req.cluster_id.clone(),
                replica,
            },
            bricks: IdSet::new(),
        })
    }

    pub fn load(tx: &impl Transaction, id: &str) -> Result<Self> {
        entry::load(tx, id)
    }

    pub fn save(&self, tx: &WriteTxn) -> Result<()> {
        entry::save(tx, self)
    }

    fn registry_key(&self) -> RegistryKey {
        RegistryKey::volume(self.info.name.as_str())
    }

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

    pub fn is_delete_ok(&self) -> bool {
        self.bricks.is_empty()
    }

    /// Remove the volume record and release its name.
    /// Refused with `Conflict` while bricks are still attached.
    pub fn delete(&self, tx: &WriteTxn) -> Result<()> {
        if !self.is_delete_ok() {
            warn!(
                id = %self.info.id,
                bricks = self.bricks.len(),
                "Unable to delete volume because it still has bricks"
            );
            return Err(StoreError::Conflict(format!(
                "volume {} still has {} brick(s)",
                self.info.id,
                self.bricks.len()
            )));
        }
        self.deregister(tx)?;
        entry::delete(tx, self)
    }

    pub fn info_response(&self, tx: &impl Transaction) -> Result<VolumeInfoResponse> {
        let bricks = self
            .bricks
            .iter()
            .map(|id| BrickEntry::load(tx, id).map(|brick| brick.info))
            .collect::<Result<Vec<_>>>()?;

        Ok(VolumeInfoResponse {
            id: self.info.id.clone(),
            name: self.info.name.clone(),
            size_gib: self.info.size_gib,
            cluster_id: self.info.cluster_id.clone(),
            replica: self.info.replica,
            bricks,
        })
    }
}
