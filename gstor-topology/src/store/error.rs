//! Store error types.

use thiserror::Error;

use super::registry::RegistryKey;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity id absent from its bucket.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Registry key already claimed by another entity.
    #[error("{key} already used by {owner}")]
    KeyExists { key: RegistryKey, owner: String },

    /// Entity still owns children and cannot be removed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller passed something the store cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity could not be encoded or decoded.
    #[error("codec: {0}")]
    Codec(#[from] bincode::Error),

    /// Data directory could not be created.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying database or transaction failure.
    #[error("storage: {0}")]
    Storage(#[from] redb::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_key_exists(&self) -> bool {
        matches!(self, StoreError::KeyExists { .. })
    }
}

macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Storage(e.into())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
