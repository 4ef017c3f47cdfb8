//! Uniqueness registry.
//!
//! Externally visible identifiers (host names, device paths, volume names)
//! are reserved by writing `role tag + value → owner id` into the registry
//! bucket. The presence of a record is the only answer to "is this name
//! taken". Role tags start with pairwise distinct letters, so two keys of
//! different roles can never be equal.

use std::fmt;

use super::db::{Bucket, Transaction};
use super::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Management host name of a node
    Manage,
    /// Storage host name of a node
    Storage,
    /// Device name scoped to its node
    Device,
    /// Volume name
    Volume,
}

impl Role {
    pub fn tag(self) -> &'static str {
        match self {
            Role::Manage => "MANAGE",
            Role::Storage => "STORAGE",
            Role::Device => "DEVICE",
            Role::Volume => "VOLUME",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Role::Manage => "management host name",
            Role::Storage => "storage host name",
            Role::Device => "device",
            Role::Volume => "volume name",
        }
    }
}

/// A registry key: one value claimed under one role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    role: Role,
    value: String,
}

impl RegistryKey {
    pub fn new(role: Role, value: impl Into<String>) -> Self {
        Self {
            role,
            value: value.into(),
        }
    }

    pub fn manage(host: impl Into<String>) -> Self {
        Self::new(Role::Manage, host)
    }

    pub fn storage(host: impl Into<String>) -> Self {
        Self::new(Role::Storage, host)
    }

    /// Device names are only unique within one node.
    pub fn device(node_id: &str, name: &str) -> Self {
        Self::new(Role::Device, format!("{node_id}:{name}"))
    }

    pub fn volume(name: impl Into<String>) -> Self {
        Self::new(Role::Volume, name)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The claimed value without its role tag.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Key as stored in the registry bucket.
    pub fn encode(&self) -> String {
        format!("{}{}", self.role.tag(), self.value)
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.role.describe(), self.value)
    }
}

/// Id of the entity that currently holds `key`, if any.
pub fn owner(tx: &impl Transaction, key: &RegistryKey) -> Result<Option<String>> {
    let owner = tx
        .get(Bucket::Registry, &key.encode())?
        .map(|raw| String::from_utf8_lossy(&raw).into_owned());
    Ok(owner)
}
