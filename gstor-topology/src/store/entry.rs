//! Generic entry operations.
//!
//! Every persisted entity implements [`Entry`]; load/save/delete and the
//! registry primitives are written once against it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::codec;
use super::db::{Bucket, Transaction, WriteTxn};
use super::error::{Result, StoreError};
use super::registry::{self, RegistryKey};

/// A persisted entity: a bucket, an id and a byte encoding.
pub trait Entry: Serialize + DeserializeOwned {
    const BUCKET: Bucket;

    fn id(&self) -> &str;

    fn marshal(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    fn unmarshal(buf: &[u8]) -> Result<Self> {
        codec::decode(buf)
    }
}

pub fn load<E: Entry>(tx: &impl Transaction, id: &str) -> Result<E> {
    match tx.get(E::BUCKET, id)? {
        Some(buf) => E::unmarshal(&buf),
        None => Err(StoreError::NotFound {
            kind: E::BUCKET.name(),
            id: id.to_string(),
        }),
    }
}

/// Write the whole entity under its id, replacing any previous version.
pub fn save<E: Entry>(tx: &WriteTxn, entry: &E) -> Result<()> {
    if entry.id().is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "cannot save {} without an id",
            E::BUCKET.name()
        )));
    }
    let buf = entry.marshal()?;
    tx.put(E::BUCKET, entry.id(), &buf)
}

pub fn delete<E: Entry>(tx: &WriteTxn, entry: &E) -> Result<()> {
    if !tx.remove(E::BUCKET, entry.id())? {
        return Err(StoreError::NotFound {
            kind: E::BUCKET.name(),
            id: entry.id().to_string(),
        });
    }
    Ok(())
}

pub fn exists<E: Entry>(tx: &impl Transaction, id: &str) -> Result<bool> {
    Ok(tx.get(E::BUCKET, id)?.is_some())
}

/// Ids of every stored entity of kind `E`, ascending.
pub fn list<E: Entry>(tx: &impl Transaction) -> Result<Vec<String>> {
    tx.keys(E::BUCKET)
}

/// Claim `key` for `entry`.
///
/// Fails with `KeyExists` carrying the current owner if the key is already
/// claimed, even by `entry` itself. Nothing is written in that case.
pub fn register<E: Entry>(tx: &WriteTxn, entry: &E, key: &RegistryKey) -> Result<()> {
    if let Some(owner) = registry::owner(tx, key)? {
        return Err(StoreError::KeyExists {
            key: key.clone(),
            owner,
        });
    }
    tx.put(Bucket::Registry, &key.encode(), entry.id().as_bytes())
}

/// Release `key` if `entry` holds it.
///
/// A missing key is not an error. A key held by another entity is left alone.
pub fn deregister<E: Entry>(tx: &WriteTxn, entry: &E, key: &RegistryKey) -> Result<()> {
    match registry::owner(tx, key)? {
        Some(owner) if owner == entry.id() => {
            tx.remove(Bucket::Registry, &key.encode())?;
        }
        Some(owner) => {
            debug!(%key, %owner, id = %entry.id(), "Not releasing key held by another entity");
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::open_db;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Thing {
        id: String,
        label: String,
    }

    impl Entry for Thing {
        const BUCKET: Bucket = Bucket::Volume;

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn thing(id: &str) -> Thing {
        Thing {
            id: id.to_string(),
            label: format!("label-{id}"),
        }
    }

    #[test]
    fn save_then_load() {
        let (_dir, db) = open_db();
        db.update(|tx| save(tx, &thing("t1"))).unwrap();

        let loaded: Thing = db.view(|tx| load(tx, "t1")).unwrap();
        assert_eq!(loaded, thing("t1"));
    }

    #[test]
    fn load_missing_is_not_found() {
        let (_dir, db) = open_db();
        let err = db.view(|tx| load::<Thing>(tx, "nope")).unwrap_err();
        match err {
            StoreError::NotFound { kind, id } => {
                assert_eq!(kind, "volume");
                assert_eq!(id, "nope");
            }
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn save_overwrites() {
        let (_dir, db) = open_db();
        db.update(|tx| save(tx, &thing("t1"))).unwrap();

        let mut changed = thing("t1");
        changed.label = "changed".into();
        db.update(|tx| save(tx, &changed)).unwrap();

        let loaded: Thing = db.view(|tx| load(tx, "t1")).unwrap();
        assert_eq!(loaded.label, "changed");
    }

    #[test]
    fn save_without_id_is_rejected() {
        let (_dir, db) = open_db();
        let err = db.update(|tx| save(tx, &thing(""))).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn delete_removes_and_missing_is_not_found() {
        let (_dir, db) = open_db();
        db.update(|tx| save(tx, &thing("t1"))).unwrap();

        db.update(|tx| delete(tx, &thing("t1"))).unwrap();
        assert!(!db.view(|tx| exists::<Thing>(tx, "t1")).unwrap());

        let err = db.update(|tx| delete(tx, &thing("t1"))).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn deleted_id_can_be_saved_again() {
        let (_dir, db) = open_db();
        db.update(|tx| save(tx, &thing("t1"))).unwrap();
        db.update(|tx| delete(tx, &thing("t1"))).unwrap();
        db.update(|tx| save(tx, &thing("t1"))).unwrap();
        assert!(db.view(|tx| exists::<Thing>(tx, "t1")).unwrap());
    }

    #[test]
    fn list_is_ordered() {
        let (_dir, db) = open_db();
        db.update(|tx| {
            for id in ["b", "c", "a"] {
                save(tx, &thing(id))?;
            }
            Ok(())
        })
        .unwrap();

        let ids = db.view(|tx| list::<Thing>(tx)).unwrap();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn register_twice_keeps_first_owner() {
        let (_dir, db) = open_db();
        let key = RegistryKey::manage("h1");

        db.update(|tx| register(tx, &thing("first"), &key)).unwrap();

        let err = db
            .update(|tx| register(tx, &thing("second"), &key))
            .unwrap_err();
        match err {
            StoreError::KeyExists { key: k, owner } => {
                assert_eq!(k, key);
                assert_eq!(owner, "first");
            }
            other => panic!("Expected KeyExists, got: {:?}", other),
        }

        // Same owner registering again is also a collision
        let err = db
            .update(|tx| register(tx, &thing("first"), &key))
            .unwrap_err();
        assert!(err.is_key_exists());

        let owner = db.view(|tx| registry::owner(tx, &key)).unwrap();
        assert_eq!(owner.as_deref(), Some("first"));
    }

    #[test]
    fn deregister_is_idempotent() {
        let (_dir, db) = open_db();
        let key = RegistryKey::storage("h1");

        db.update(|tx| register(tx, &thing("t1"), &key)).unwrap();
        db.update(|tx| deregister(tx, &thing("t1"), &key)).unwrap();
        db.update(|tx| deregister(tx, &thing("t1"), &key)).unwrap();

        assert!(db.view(|tx| registry::owner(tx, &key)).unwrap().is_none());
        db.update(|tx| register(tx, &thing("t2"), &key)).unwrap();
    }

    #[test]
    fn deregister_leaves_foreign_claim() {
        let (_dir, db) = open_db();
        let key = RegistryKey::manage("h1");

        db.update(|tx| register(tx, &thing("owner"), &key)).unwrap();
        db.update(|tx| deregister(tx, &thing("intruder"), &key))
            .unwrap();

        let owner = db.view(|tx| registry::owner(tx, &key)).unwrap();
        assert_eq!(owner.as_deref(), Some("owner"));
    }
}
