//! Service Layer Error Types
//!
//! Typed outcomes for feed operations. Callers can distinguish a bad
//! collection name, an unprovisioned collection, a missing record, and a
//! payload that failed to (de)serialize from plain storage failures.

use crate::db::DatabaseError;
use thiserror::Error;

/// Feed service operation errors
#[derive(Error, Debug)]
pub enum FeedServiceError {
    /// Provisioning was given a name outside `[a-z0-9_]+`
    #[error("Invalid collection name '{name}': must match ^[a-z0-9_]+$")]
    InvalidCollectionName { name: String },

    /// Record operation against a collection that was never provisioned
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    /// Single-record operation targeting a nonexistent id
    #[error("Record {id} not found in collection {collection}")]
    RecordNotFound { collection: String, id: i64 },

    /// Payload failed to serialize on insert or deserialize on read
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[source] DatabaseError),
}

impl FeedServiceError {
    /// Create an invalid collection name error
    pub fn invalid_collection_name(name: impl Into<String>) -> Self {
        Self::InvalidCollectionName { name: name.into() }
    }

    /// Create a collection not found error
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::CollectionNotFound { name: name.into() }
    }

    /// Create a record not found error
    pub fn record_not_found(collection: impl Into<String>, id: i64) -> Self {
        Self::RecordNotFound {
            collection: collection.into(),
            id,
        }
    }

    /// True for the not-found family (collection or record)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CollectionNotFound { .. } | Self::RecordNotFound { .. }
        )
    }
}

impl From<DatabaseError> for FeedServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::MalformedPayload(source) => Self::MalformedPayload(source),
            other => Self::DatabaseError(other),
        }
    }
}
