//! Topology operations.
//!
//! Each operation is one transaction: it loads what it needs, updates the
//! entity and every parent/child list that refers to it, and commits. Any
//! error aborts the whole operation, so a failed call never leaves half an
//! entity or a dangling reference behind.

use std::collections::{BTreeMap, btree_map};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::entities::{BrickEntry, ClusterEntry, DeviceEntry, NodeEntry, VolumeEntry};
use crate::requests::{BrickPlacement, DeviceAddRequest, NodeAddRequest, VolumeCreateRequest};
use crate::response::{
    ClusterInfoResponse, ClusterListResponse, DeviceInfoResponse, NodeInfoResponse,
    VolumeInfoResponse, VolumeListResponse,
};
use crate::store::{Db, Result, StoreError, WriteTxn, entry};

/// Handle for reading and changing the cluster topology.
#[derive(Clone)]
pub struct Topology {
    db: Arc<Db>,
}

impl Topology {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Open (or create) the store described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(Arc::new(Db::open(config)?)))
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    // =========================================================================
    // Clusters
    // =========================================================================

    pub fn create_cluster(&self) -> Result<ClusterInfoResponse> {
        let cluster = ClusterEntry::new();
        self.db.update(|tx| cluster.save(tx))?;
        info!(id = %cluster.info.id, "Created cluster");
        Ok(cluster.info_response())
    }

    pub fn list_clusters(&self) -> Result<ClusterListResponse> {
        let clusters = self.db.view(|tx| entry::list::<ClusterEntry>(tx))?;
        Ok(ClusterListResponse { clusters })
    }

    pub fn cluster_info(&self, id: &str) -> Result<ClusterInfoResponse> {
        self.db.view(|tx| ClusterEntry::load(tx, id).map(|c| c.info_response()))
    }

    pub fn delete_cluster(&self, id: &str) -> Result<()> {
        self.db.update(|tx| ClusterEntry::load(tx, id)?.delete(tx))?;
        info!(id = %id, "Deleted cluster");
        Ok(())
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    pub fn add_node(&self, req: &NodeAddRequest) -> Result<NodeInfoResponse> {
        let node = NodeEntry::from_request(req);
        let response = self.db.update(|tx| {
            let mut cluster = ClusterEntry::load(tx, &req.cluster_id)?;
            node.register(tx)?;
            node.save(tx)?;
            cluster.node_add(node.info.id.as_str());
            cluster.save(tx)?;
            node.info_response(tx)
        })?;
        info!(
            id = %node.info.id,
            cluster_id = %req.cluster_id,
            "Added node"
        );
        Ok(response)
    }

    pub fn node_info(&self, id: &str) -> Result<NodeInfoResponse> {
        self.db.view(|tx| NodeEntry::load(tx, id)?.info_response(tx))
    }

    pub fn delete_node(&self, id: &str) -> Result<()> {
        self.db.update(|tx| {
            let node = NodeEntry::load(tx, id)?;
            // Refuse before touching the cluster
            if !node.is_delete_ok() {
                return node.delete(tx);
            }
            let mut cluster = ClusterEntry::load(tx, &node.info.cluster_id)?;
            cluster.node_delete(id);
            cluster.save(tx)?;
            node.delete(tx)
        })?;
        info!(id = %id, "Deleted node");
        Ok(())
    }

    // =========================================================================
    // Devices
    // =========================================================================

    pub fn add_device(&self, req: &DeviceAddRequest) -> Result<DeviceInfoResponse> {
        let device = DeviceEntry::from_request(req);
        let response = self.db.update(|tx| {
            let mut node = NodeEntry::load(tx, &req.node_id)?;
            device.register(tx)?;
            device.save(tx)?;
            node.device_add(device.info.id.as_str());
            node.save(tx)?;
            device.info_response(tx)
        })?;
        info!(
            id = %device.info.id,
            node_id = %req.node_id,
            name = %req.name,
            size_kib = req.size_kib,
            "Added device"
        );
        Ok(response)
    }

    pub fn device_info(&self, id: &str) -> Result<DeviceInfoResponse> {
        self.db.view(|tx| DeviceEntry::load(tx, id)?.info_response(tx))
    }

    pub fn delete_device(&self, id: &str) -> Result<()> {
        self.db.update(|tx| {
            let device = DeviceEntry::load(tx, id)?;
            device.delete(tx)?;
            let mut node = NodeEntry::load(tx, &device.info.node_id)?;
            node.device_delete(id);
            node.save(tx)
        })?;
        info!(id = %id, "Deleted device");
        Ok(())
    }

    // =========================================================================
    // Volumes
    // =========================================================================

    /// Record a volume whose bricks have already been placed.
    ///
    /// Every placement must name a device on a node of the volume's cluster
    /// with enough free space. The number of placements must be a multiple of
    /// the replica count, and together they must hold `size_gib` once per
    /// replica.
    pub fn create_volume(
        &self,
        req: &VolumeCreateRequest,
        placements: &[BrickPlacement],
    ) -> Result<VolumeInfoResponse> {
        let mut volume = VolumeEntry::from_request(req)?;
        check_placements(placements, volume.info.replica, volume.info.size_gib)?;

        let response = self.db.update(|tx| {
            let mut cluster = ClusterEntry::load(tx, &volume.info.cluster_id)?;
            volume.register(tx)?;
            place_bricks(tx, &mut volume, placements)?;
            volume.save(tx)?;
            cluster.volume_add(volume.info.id.as_str());
            cluster.save(tx)?;
            volume.info_response(tx)
        })?;

        info!(
            id = %response.id,
            name = %response.name,
            bricks = response.bricks.len(),
            "Created volume"
        );
        Ok(response)
    }

    /// Grow a volume by `add_gib` using bricks that have already been placed.
    ///
    /// Placements follow the same rules as [`Topology::create_volume`], sized
    /// for the added capacity only.
    pub fn expand_volume(
        &self,
        id: &str,
        add_gib: u64,
        placements: &[BrickPlacement],
    ) -> Result<VolumeInfoResponse> {
        if add_gib == 0 {
            return Err(StoreError::InvalidArgument(
                "volume expansion must add at least 1 GiB".into(),
            ));
        }

        let response = self.db.update(|tx| {
            let mut volume = VolumeEntry::load(tx, id)?;
            check_placements(placements, volume.info.replica, add_gib)?;
            volume.info.size_gib = volume.info.size_gib.checked_add(add_gib).ok_or_else(|| {
                StoreError::InvalidArgument(format!("volume {id} cannot grow by {add_gib} GiB"))
            })?;
            place_bricks(tx, &mut volume, placements)?;
            volume.save(tx)?;
            volume.info_response(tx)
        })?;

        info!(
            id = %id,
            add_gib,
            size_gib = response.size_gib,
            bricks = response.bricks.len(),
            "Expanded volume"
        );
        Ok(response)
    }

    pub fn volume_info(&self, id: &str) -> Result<VolumeInfoResponse> {
        self.db.view(|tx| VolumeEntry::load(tx, id)?.info_response(tx))
    }

    pub fn list_volumes(&self) -> Result<VolumeListResponse> {
        let volumes = self.db.view(|tx| entry::list::<VolumeEntry>(tx))?;
        Ok(VolumeListResponse { volumes })
    }

    /// Delete a volume together with its bricks, returning their space to
    /// the devices they were carved from.
    pub fn delete_volume(&self, id: &str) -> Result<()> {
        self.db.update(|tx| {
            let mut volume = VolumeEntry::load(tx, id)?;

            let mut devices: BTreeMap<String, DeviceEntry> = BTreeMap::new();
            for brick_id in volume.bricks.to_vec() {
                let brick = BrickEntry::load(tx, &brick_id)?;
                let device = cached_device(tx, &mut devices, &brick.info.device_id)?;
                device.storage_free(brick.info.size_kib);
                device.brick_delete(&brick_id);
                brick.delete(tx)?;
                volume.brick_delete(&brick_id);
            }
            for device in devices.values() {
                device.save(tx)?;
            }

            let mut cluster = ClusterEntry::load(tx, &volume.info.cluster_id)?;
            cluster.volume_delete(id);
            cluster.save(tx)?;
            volume.delete(tx)
        })?;
        info!(id = %id, "Deleted volume");
        Ok(())
    }
}

/// KiB in one GiB.
const KIB_PER_GIB: u64 = 1024 * 1024;

/// Reject placements that cannot back `size_gib` at the given replica count.
fn check_placements(placements: &[BrickPlacement], replica: u32, size_gib: u64) -> Result<()> {
    if placements.is_empty() {
        return Err(StoreError::InvalidArgument(
            "volume needs at least one brick".into(),
        ));
    }
    let replica = u64::from(replica);
    if placements.len() as u64 % replica != 0 {
        return Err(StoreError::InvalidArgument(format!(
            "{} brick(s) cannot be split into replica sets of {}",
            placements.len(),
            replica
        )));
    }
    if let Some(empty) = placements.iter().find(|p| p.size_kib == 0) {
        return Err(StoreError::InvalidArgument(format!(
            "brick on device {} has no size",
            empty.device_id
        )));
    }

    let total = placements
        .iter()
        .fold(0u64, |sum, p| sum.saturating_add(p.size_kib));
    let needed = size_gib
        .saturating_mul(KIB_PER_GIB)
        .saturating_mul(replica);
    if total < needed {
        return Err(StoreError::InvalidArgument(format!(
            "{total} KiB of bricks cannot hold {size_gib} GiB with replica {replica}"
        )));
    }
    Ok(())
}

/// Carve one brick per placement out of its device and attach it to `volume`.
/// Saves the bricks and the touched devices; the caller saves the volume.
fn place_bricks(
    tx: &WriteTxn,
    volume: &mut VolumeEntry,
    placements: &[BrickPlacement],
) -> Result<()> {
    let mut devices: BTreeMap<String, DeviceEntry> = BTreeMap::new();
    for placement in placements {
        let device = cached_device(tx, &mut devices, &placement.device_id)?;
        let node = NodeEntry::load(tx, &device.info.node_id)?;
        if node.info.cluster_id != volume.info.cluster_id {
            return Err(StoreError::InvalidArgument(format!(
                "device {} is on node {} outside cluster {}",
                device.info.id, node.info.id, volume.info.cluster_id
            )));
        }

        device.storage_allocate(placement.size_kib)?;
        let brick = BrickEntry::new(
            &device.info.id,
            &node.info.id,
            &volume.info.id,
            placement.size_kib,
        );
        device.brick_add(brick.info.id.as_str());
        volume.brick_add(brick.info.id.as_str());
        brick.save(tx)?;
        debug!(
            brick_id = %brick.info.id,
            device_id = %device.info.id,
            size_kib = brick.info.size_kib,
            "Placed brick"
        );
    }

    for device in devices.values() {
        device.save(tx)?;
    }
    Ok(())
}

/// Load a device once per transaction so repeated placements on the same
/// device see each other's allocations.
fn cached_device<'a>(
    tx: &WriteTxn,
    devices: &'a mut BTreeMap<String, DeviceEntry>,
    id: &str,
) -> Result<&'a mut DeviceEntry> {
    match devices.entry(id.to_string()) {
        btree_map::Entry::Occupied(slot) => Ok(slot.into_mut()),
        btree_map::Entry::Vacant(slot) => Ok(slot.insert(DeviceEntry::load(tx, id)?)),
    }
}
