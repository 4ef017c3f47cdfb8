//! Client-facing projections of stored entities.
//!
//! These are assembled inside a transaction by walking an entity's children
//! and are never written back.

use serde::{Deserialize, Serialize};

use crate::entities::{BrickInfo, HostAddresses, StorageSize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfoResponse {
    pub id: String,
    pub nodes: Vec<String>,
    pub volumes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterListResponse {
    pub clusters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfoResponse {
    pub id: String,
    pub cluster_id: String,
    pub hostnames: HostAddresses,
    pub zone: i32,
    pub devices: Vec<DeviceInfoResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfoResponse {
    pub id: String,
    pub name: String,
    pub node_id: String,
    pub storage: StorageSize,
    pub bricks: Vec<BrickInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfoResponse {
    pub id: String,
    pub name: String,
    pub size_gib: u64,
    pub cluster_id: String,
    pub replica: u32,
    pub bricks: Vec<BrickInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeListResponse {
    pub volumes: Vec<String>,
}
