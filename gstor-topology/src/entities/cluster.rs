use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::response::ClusterInfoResponse;
use crate::store::{Bucket, Entry, IdSet, Result, StoreError, Transaction, WriteTxn, entry};

use super::generate_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: String,
    pub nodes: IdSet,
    pub volumes: IdSet,
}

/// A cluster: the authoritative list of its nodes and volumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub info: ClusterInfo,
}

impl Entry for ClusterEntry {
    const BUCKET: Bucket = Bucket::Cluster;

    fn id(&self) -> &str {
        &self.info.id
    }
}

impl ClusterEntry {
    /// New empty cluster with a fresh id. Not visible until saved.
    pub fn new() -> Self {
        Self::with_id(generate_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            info: ClusterInfo {
                id: id.into(),
                ..Default::default()
            },
        }
    }

    pub fn load(tx: &impl Transaction, id: &str) -> Result<Self> {
        entry::load(tx, id)
    }

    pub fn save(&self, tx: &WriteTxn) -> Result<()> {
        entry::save(tx, self)
    }

    pub fn node_add(&mut self, id: impl Into<String>) -> bool {
        self.info.nodes.insert(id)
    }

    pub fn node_delete(&mut self, id: &str) -> bool {
        self.info.nodes.remove(id)
    }

    pub fn volume_add(&mut self, id: impl Into<String>) -> bool {
        self.info.volumes.insert(id)
    }

    pub fn volume_delete(&mut self, id: &str) -> bool {
        self.info.volumes.remove(id)
    }

    pub fn is_delete_ok(&self) -> bool {
        self.info.nodes.is_empty() && self.info.volumes.is_empty()
    }

    /// Remove the cluster. Refused with `Conflict` while it has nodes or volumes.
    pub fn delete(&self, tx: &WriteTxn) -> Result<()> {
        if !self.is_delete_ok() {
            warn!(
                id = %self.info.id,
                nodes = self.info.nodes.len(),
                volumes = self.info.volumes.len(),
                "Unable to delete cluster because it still has nodes or volumes"
            );
            return Err(StoreError::Conflict(format!(
                "cluster {} still has {} node(s) and {} volume(s)",
                self.info.id,
                self.info.nodes.len(),
                self.info.volumes.len()
            )));
        }
        entry::delete(tx, self)
    }

    pub fn info_response(&self) -> ClusterInfoResponse {
        ClusterInfoResponse {
            id: self.info.id.clone(),
            nodes: self.info.nodes.to_vec(),
            volumes: self.info.volumes.to_vec(),
        }
    }
}
