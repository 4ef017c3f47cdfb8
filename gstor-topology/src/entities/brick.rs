use serde::{Deserialize, Serialize};

use crate::store::{Bucket, Entry, Result, Transaction, WriteTxn, entry};

use super::generate_id;

/// Base directory bricks are mounted under on a storage node.
const MOUNT_ROOT: &str = "/var/lib/gstor/mounts";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickInfo {
    pub id: String,
    pub path: String,
    pub device_id: String,
    pub node_id: String,
    pub volume_id: String,
    pub size_kib: u64,
}

/// A slice of one device backing part of one volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickEntry {
    pub info: BrickInfo,
}

impl Entry for BrickEntry {
    const BUCKET: Bucket = Bucket::Brick;

    fn id(&self) -> &str {
        &self.info.id
    }
}

impl BrickEntry {
    pub fn new(device_id: &str, node_id: &str, volume_id: &str, size_kib: u64) -> Self {
        let id = generate_id();
        Self {
            info: BrickInfo {
                path: format!("{MOUNT_ROOT}/vg_{device_id}/brick_{id}/brick"),
                id,
                device_id: device_id.to_string(),
                node_id: node_id.to_string(),
                volume_id: volume_id.to_string(),
                size_kib,
            },
        }
    }

    pub fn load(tx: &impl Transaction, id: &str) -> Result<Self> {
        entry::load(tx, id)
    }

    pub fn save(&self, tx: &WriteTxn) -> Result<()> {
        entry::save(tx, self)
    }

    pub fn delete(&self, tx: &WriteTxn) -> Result<()> {
        entry::delete(tx, self)
    }
}
