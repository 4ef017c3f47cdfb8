//! Topology entities.
//!
//! Each entity wraps an info record plus the ids of the children it owns.
//! Parent lists and child back-references are kept consistent by the
//! callers in [`crate::topology`]; the mutation methods here only touch the
//! entity they are called on.

mod brick;
mod cluster;
mod device;
mod node;
mod volume;

pub use brick::{BrickEntry, BrickInfo};
pub use cluster::{ClusterEntry, ClusterInfo};
pub use device::{DeviceEntry, DeviceInfo, StorageSize};
pub use node::{HostAddresses, NodeEntry, NodeInfo};
pub use volume::{DEFAULT_REPLICA, VolumeEntry, VolumeInfo};

/// Fresh random entity id: 32 lowercase hex characters.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
