//! Request shapes handed to the store by the API layer.

use serde::{Deserialize, Serialize};

use crate::entities::HostAddresses;

// =============================================================================
// Node Request DTOs
// =============================================================================

/// Request to add a node to a cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeAddRequest {
    pub cluster_id: String,
    pub hostnames: HostAddresses,
    pub zone: i32,
}

// =============================================================================
// Device Request DTOs
// =============================================================================

/// Request to add a raw block device to a node.
///
/// `size_kib` is what the host reported for the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceAddRequest {
    pub node_id: String,
    pub name: String,
    pub size_kib: u64,
}

// =============================================================================
// Volume Request DTOs
// =============================================================================

/// Request to record a new volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeCreateRequest {
    pub cluster_id: String,
    pub size_gib: u64,
    /// Defaults to `vol_<id>`
    pub name: Option<String>,
    /// Defaults to 3
    pub replica: Option<u32>,
}

/// One brick decided by the allocator: which device, how large.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickPlacement {
    pub device_id: String,
    pub size_kib: u64,
}
