//! Test helpers for topology integration tests.

use gstor_topology::entities::HostAddresses;
use gstor_topology::requests::{DeviceAddRequest, NodeAddRequest};
use gstor_topology::response::{DeviceInfoResponse, NodeInfoResponse};
use gstor_topology::{Config, SyncMode, Topology};
use tempfile::TempDir;

/// A topology store in a temporary directory, removed on drop.
pub struct TestStore {
    _dir: TempDir,
    pub topology: Topology,
}

impl TestStore {
    pub fn open() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let config = Config::new(dir.path()).with_sync_mode(SyncMode::None);
        let topology = Topology::open(&config).expect("open topology store");
        Self {
            _dir: dir,
            topology,
        }
    }

    pub fn add_node(&self, cluster_id: &str, manage: &[&str], storage: &[&str]) -> NodeInfoResponse {
        self.topology
            .add_node(&node_request(cluster_id, manage, storage))
            .expect("add node")
    }

    pub fn add_device(&self, node_id: &str, name: &str, size_kib: u64) -> DeviceInfoResponse {
        self.topology
            .add_device(&DeviceAddRequest {
                node_id: node_id.to_string(),
                name: name.to_string(),
                size_kib,
            })
            .expect("add device")
    }
}

pub fn node_request(cluster_id: &str, manage: &[&str], storage: &[&str]) -> NodeAddRequest {
    NodeAddRequest {
        cluster_id: cluster_id.to_string(),
        hostnames: HostAddresses {
            manage: manage.iter().map(|s| s.to_string()).collect(),
            storage: storage.iter().map(|s| s.to_string()).collect(),
        },
        zone: 1,
    }
}
