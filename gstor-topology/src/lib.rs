//! gstor topology store
//!
//! Transactional persistence for the cluster topology of a distributed
//! storage manager: clusters, the nodes in them, the block devices on those
//! nodes, and the volumes carved out of those devices as bricks.
//!
//! # Example
//! ```ignore
//! use gstor_topology::{Config, Topology};
//! use gstor_topology::entities::HostAddresses;
//! use gstor_topology::requests::NodeAddRequest;
//!
//! let topology = Topology::open(&Config::new("/var/lib/gstor/topology"))?;
//! let cluster = topology.create_cluster()?;
//! let node = topology.add_node(&NodeAddRequest {
//!     cluster_id: cluster.id.clone(),
//!     hostnames: HostAddresses {
//!         manage: vec!["node1.mgmt".into()],
//!         storage: vec!["10.0.0.1".into()],
//!     },
//!     zone: 1,
//! })?;
//! ```

pub mod config;
pub mod entities;
pub mod requests;
pub mod response;
pub mod store;
pub mod topology;

#[cfg(test)]
mod test_support;

pub use config::{Config, SyncMode};
pub use store::{Db, StoreError};
pub use topology::Topology;
