use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::requests::NodeAddRequest;
use crate::response::NodeInfoResponse;
use crate::store::{
    Bucket, Entry, IdSet, RegistryKey, Result, StoreError, Transaction, WriteTxn, entry,
};

use super::device::DeviceEntry;
use super::generate_id;

/// Host names a node is reachable under. The first entry of each list is
/// the one used to talk to the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAddresses {
    pub manage: Vec<String>,
    pub storage: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    pub cluster_id: String,
    pub hostnames: HostAddresses,
    pub zone: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub info: NodeInfo,
    pub devices: IdSet,
}

impl Entry for NodeEntry {
    const BUCKET: Bucket = Bucket::Node;

    fn id(&self) -> &str {
        &self.info.id
    }
}

impl NodeEntry {
    pub fn from_request(req: &NodeAddRequest) -> Self {
        Self {
            info: NodeInfo {
                id: generate_id(),
                cluster_id: req.cluster_id.clone(),
                hostnames: req.hostnames.clone(),
                zone: req.zone,
            },
            devices: IdSet::new(),
        }
    }

    pub fn load(tx: &impl Transaction, id: &str) -> Result<Self> {
        entry::load(tx, id)
    }

    pub fn save(&self, tx: &WriteTxn) -> Result<()> {
        entry::save(tx, self)
    }

    pub fn manage_hostname(&self) -> Result<&str> {
        self.info
            .hostnames
            .manage
            .first()
            .map(String::as_str)
            .ok_or_else(|| {
                StoreError::InvalidArgument(format!(
                    "node {} has no management host name",
                    self.info.id
                ))
            })
    }

    pub fn storage_hostname(&self) -> Result<&str> {
        self.info
            .hostnames
            .storage
            .first()
            .map(String::as_str)
            .ok_or_else(|| {
                StoreError::InvalidArgument(format!(
                    "node {} has no storage host name",
                    self.info.id
                ))
            })
    }

    /// Registry keys for every host name, management names first.
    fn registry_keys(&self) -> Vec<RegistryKey> {
        let hosts = &self.info.hostnames;
        let mut keys: Vec<RegistryKey> = Vec::new();
        let candidates = hosts
            .manage
            .iter()
            .map(RegistryKey::manage)
            .chain(hosts.storage.iter().map(RegistryKey::storage));
        for key in candidates {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Claim every host name of this node.
    ///
    /// All or nothing: if any name is already taken, the names claimed so far
    /// in this call are released again before the `KeyExists` error is
    /// returned.
    pub fn register(&self, tx: &WriteTxn) -> Result<()> {
        let mut claimed: Vec<RegistryKey> = Vec::new();
        for key in self.registry_keys() {
            match entry::register(tx, self, &key) {
                Ok(()) => claimed.push(key),
                Err(err) => {
                    if let StoreError::KeyExists { key, owner } = &err {
                        warn!(
                            id = %self.info.id,
                            %key,
                            %owner,
                            "Host name already used by another node"
                        );
                    }
                    for key in &claimed {
                        entry::deregister(tx, self, key)?;
                    }
                    return Err(err);
                }
            }
        }
        debug!(id = %self.info.id, count = claimed.len(), "Registered node host names");
        Ok(())
    }

    /// Release every host name this node holds. Names it never claimed are skipped.
    pub fn deregister(&self, tx: &WriteTxn) -> Result<()> {
        for key in self.registry_keys() {
            entry::deregister(tx, self, &key)?;
        }
        Ok(())
    }

    /// Add a device id. Returns `false` if it was already attached.
    pub fn device_add(&mut self, id: impl Into<String>) -> bool {
        self.devices.insert(id)
    }

    pub fn device_delete(&mut self, id: &str) -> bool {
        self.devices.remove(id)
    }

    pub fn is_delete_ok(&self) -> bool {
        self.devices.is_empty()
    }

    /// Remove the node and release its host names.
    /// Refused with `Conflict` while devices are attached.
    pub fn delete(&self, tx: &WriteTxn) -> Result<()> {
        if !self.is_delete_ok() {
            warn!(
                id = %self.info.id,
                devices = self.devices.len(),
                "Unable to delete node because it contains devices"
            );
            return Err(StoreError::Conflict(format!(
                "node {} still has {} device(s)",
                self.info.id,
                self.devices.len()
            )));
        }
        self.deregister(tx)?;
        entry::delete(tx, self)
    }

    pub fn info_response(&self, tx: &impl Transaction) -> Result<NodeInfoResponse> {
        let mut devices = Vec::with_capacity(self.devices.len());
        for device_id in &self.devices {
            let device = DeviceEntry::load(tx, device_id)?;
            devices.push(device.info_response(tx)?);
        }

        Ok(NodeInfoResponse {
            id: self.info.id.clone(),
            cluster_id: self.info.cluster_id.clone(),
            hostnames: self.info.hostnames.clone(),
            zone: self.info.zone,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::registry;
    use crate::test_support::open_db;

    fn request(manage: &[&str], storage: &[&str]) -> NodeAddRequest {
        NodeAddRequest {
            cluster_id: "cluster-1".into(),
            hostnames: HostAddresses {
                manage: manage.iter().map(|s| s.to_string()).collect(),
                storage: storage.iter().map(|s| s.to_string()).collect(),
            },
            zone: 2,
        }
    }

    fn owner_of(db: &crate::store::Db, key: &RegistryKey) -> Option<String> {
        db.view(|tx| registry::owner(tx, key)).unwrap()
    }

    #[test]
    fn from_request_copies_fields() {
        let req = request(&["m1"], &["s1"]);
        let node = NodeEntry::from_request(&req);
        assert_eq!(node.info.id.len(), 32);
        assert_eq!(node.info.cluster_id, "cluster-1");
        assert_eq!(node.info.hostnames, req.hostnames);
        assert_eq!(node.info.zone, 2);
        assert!(node.devices.is_empty());
    }

    #[test]
    fn first_hostnames() {
        let node = NodeEntry::from_request(&request(&["m1", "m2"], &["s1", "s2"]));
        assert_eq!(node.manage_hostname().unwrap(), "m1");
        assert_eq!(node.storage_hostname().unwrap(), "s1");
    }

    #[test]
    fn missing_hostnames_are_contract_errors() {
        let node = NodeEntry::from_request(&request(&[], &[]));
        assert!(matches!(
            node.manage_hostname(),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            node.storage_hostname(),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn devices_stay_sorted() {
        let mut node = NodeEntry::from_request(&request(&["m1"], &["s1"]));
        for id in ["d3", "d1", "d2"] {
            assert!(node.device_add(id));
        }
        assert!(!node.device_add("d2"));
        assert_eq!(node.devices.as_slice(), ["d1", "d2", "d3"]);

        assert!(node.device_delete("d2"));
        assert!(!node.device_delete("d2"));
        assert_eq!(node.devices.as_slice(), ["d1", "d3"]);
    }

    #[test]
    fn marshal_round_trip() {
        let mut node = NodeEntry::from_request(&request(&["m1", "m2"], &["s1"]));
        node.device_add("d1");
        node.device_add("d0");

        let decoded = NodeEntry::unmarshal(&node.marshal().unwrap()).unwrap();
        assert_eq!(decoded, node);

        let bare = NodeEntry::from_request(&request(&["m1"], &["s1"]));
        let decoded = NodeEntry::unmarshal(&bare.marshal().unwrap()).unwrap();
        assert!(decoded.devices.is_empty());
    }

    #[test]
    fn register_claims_all_hostnames() {
        let (_dir, db) = open_db();
        let node = NodeEntry::from_request(&request(&["m1", "m2"], &["s1"]));
        db.update(|tx| node.register(tx)).unwrap();

        for key in [
            RegistryKey::manage("m1"),
            RegistryKey::manage("m2"),
            RegistryKey::storage("s1"),
        ] {
            assert_eq!(owner_of(&db, &key).as_deref(), Some(node.info.id.as_str()));
        }
        // Roles are separate namespaces
        assert!(owner_of(&db, &RegistryKey::storage("m1")).is_none());
    }

    #[test]
    fn same_name_in_both_roles_is_allowed() {
        let (_dir, db) = open_db();
        let node = NodeEntry::from_request(&request(&["h1"], &["h1"]));
        db.update(|tx| node.register(tx)).unwrap();

        assert!(owner_of(&db, &RegistryKey::manage("h1")).is_some());
        assert!(owner_of(&db, &RegistryKey::storage("h1")).is_some());
    }

    #[test]
    fn collision_reports_owner_and_hostname() {
        let (_dir, db) = open_db();
        let n1 = NodeEntry::from_request(&request(&["h1"], &["s1"]));
        db.update(|tx| n1.register(tx)).unwrap();

        let n2 = NodeEntry::from_request(&request(&["h1"], &["s2"]));
        let err = db.update(|tx| n2.register(tx)).unwrap_err();
        match err {
            StoreError::KeyExists { key, owner } => {
                assert_eq!(key.value(), "h1");
                assert_eq!(owner, n1.info.id);
            }
            other => panic!("Expected KeyExists, got: {:?}", other),
        }
    }

    #[test]
    fn failed_register_leaves_no_claims() {
        let (_dir, db) = open_db();
        let n1 = NodeEntry::from_request(&request(&["taken"], &["s-taken"]));
        db.update(|tx| n1.register(tx)).unwrap();

        // Collides on its second management name and on its storage name
        let n2 = NodeEntry::from_request(&request(&["fresh", "taken"], &["s-fresh"]));

        // Inspect the transaction itself, before any abort could hide a leak
        let tx = db.begin_write().unwrap();
        let err = n2.register(&tx).unwrap_err();
        assert!(err.is_key_exists());
        assert!(registry::owner(&tx, &RegistryKey::manage("fresh")).unwrap().is_none());
        assert!(registry::owner(&tx, &RegistryKey::storage("s-fresh")).unwrap().is_none());
        tx.commit().unwrap();

        assert!(owner_of(&db, &RegistryKey::manage("fresh")).is_none());
        assert_eq!(
            owner_of(&db, &RegistryKey::manage("taken")).as_deref(),
            Some(n1.info.id.as_str())
        );

        // The name is free for someone else afterwards
        let n3 = NodeEntry::from_request(&request(&["fresh"], &["s-fresh"]));
        db.update(|tx| n3.register(tx)).unwrap();
    }

    #[test]
    fn storage_collision_releases_manage_claims() {
        let (_dir, db) = open_db();
        let n1 = NodeEntry::from_request(&request(&["m1"], &["shared"]));
        db.update(|tx| n1.register(tx)).unwrap();

        let n2 = NodeEntry::from_request(&request(&["m2", "m3"], &["shared"]));
        let tx = db.begin_write().unwrap();
        let err = n2.register(&tx).unwrap_err();
        assert!(err.is_key_exists());
        assert!(registry::owner(&tx, &RegistryKey::manage("m2")).unwrap().is_none());
        assert!(registry::owner(&tx, &RegistryKey::manage("m3")).unwrap().is_none());
        tx.commit().unwrap();
    }

    #[test]
    fn deregister_tolerates_unclaimed_names() {
        let (_dir, db) = open_db();
        let n1 = NodeEntry::from_request(&request(&["h1"], &["s1"]));
        db.update(|tx| n1.register(tx)).unwrap();

        // n2 never registered; h1 belongs to n1 and must survive
        let n2 = NodeEntry::from_request(&request(&["h1", "h2"], &["s2"]));
        db.update(|tx| n2.deregister(tx)).unwrap();

        assert_eq!(
            owner_of(&db, &RegistryKey::manage("h1")).as_deref(),
            Some(n1.info.id.as_str())
        );
    }

    #[test]
    fn delete_with_devices_is_conflict() {
        let (_dir, db) = open_db();
        let mut node = NodeEntry::from_request(&request(&["m1"], &["s1"]));
        node.device_add("d1");
        db.update(|tx| {
            node.register(tx)?;
            node.save(tx)
        })
        .unwrap();

        let err = db.update(|tx| node.delete(tx)).unwrap_err();
        assert!(err.is_conflict());
        // Host names remain claimed after the refused delete
        assert!(owner_of(&db, &RegistryKey::manage("m1")).is_some());

        node.device_delete("d1");
        db.update(|tx| {
            node.save(tx)?;
            node.delete(tx)
        })
        .unwrap();

        let err = db.view(|tx| NodeEntry::load(tx, &node.info.id)).unwrap_err();
        assert!(err.is_not_found());
        assert!(owner_of(&db, &RegistryKey::manage("m1")).is_none());
        assert!(owner_of(&db, &RegistryKey::storage("s1")).is_none());
    }

    #[test]
    fn info_response_without_devices() {
        let (_dir, db) = open_db();
        let node = NodeEntry::from_request(&request(&["m1"], &["s1"]));
        db.update(|tx| node.save(tx)).unwrap();

        let info = db
            .view(|tx| NodeEntry::load(tx, &node.info.id)?.info_response(tx))
            .unwrap();
        assert_eq!(info.id, node.info.id);
        assert_eq!(info.cluster_id, "cluster-1");
        assert_eq!(info.zone, 2);
        assert!(info.devices.is_empty());
    }

    #[test]
    fn info_response_with_dangling_device_fails() {
        let (_dir, db) = open_db();
        let mut node = NodeEntry::from_request(&request(&["m1"], &["s1"]));
        node.device_add("ghost");
        db.update(|tx| node.save(tx)).unwrap();

        let err = db.view(|tx| node.info_response(tx)).unwrap_err();
        assert!(err.is_not_found());
    }
}
