//! Collection Service
//!
//! Provisions collections and answers "does this collection exist?".
//!
//! ## Naming Rules
//!
//! Two rules apply to collection names, on purpose:
//! - Provisioning accepts only `^[a-z0-9_]+$` (lower-case, non-empty)
//! - Record operations go through [`crate::db::physical_name`], which strips
//!   anything outside `[A-Za-z0-9_]` without rejecting
//!
//! ## Architecture
//!
//! - The registry (`feed_collection`) is the source of truth for existence
//! - Provisioning is idempotent: table and indexes are `IF NOT EXISTS`, the
//!   registry insert is `OR IGNORE`
//! - Collections are never dropped here

use crate::db::{CollectionTable, DatabaseService};
use crate::services::error::FeedServiceError;
use crate::services::schema_table_manager::SchemaTableManager;
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful `create_collection` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// This call registered the collection
    Created,
    /// The collection was already registered; nothing changed
    AlreadyExists,
}

/// Check a name against the provisioning rule `^[a-z0-9_]+$`
///
/// # Examples
///
/// ```
/// use feed_core::services::collection_service::is_valid_collection_name;
///
/// assert!(is_valid_collection_name("chat_v2"));
/// assert!(!is_valid_collection_name("Chat"));
/// assert!(!is_valid_collection_name("ab!c"));
/// assert!(!is_valid_collection_name(""));
/// ```
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Schema provisioner and collection registry
#[derive(Debug, Clone)]
pub struct CollectionService {
    db: Arc<DatabaseService>,
    table_manager: SchemaTableManager,
}

impl CollectionService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            db,
            table_manager: SchemaTableManager::new(),
        }
    }

    /// Provision a collection's table and indexes, then register it
    ///
    /// Safe to call repeatedly and concurrently for the same name; only
    /// one caller observes [`ProvisionOutcome::Created`].
    ///
    /// # Errors
    ///
    /// - `InvalidCollectionName` if `name` does not match `^[a-z0-9_]+$`
    /// - `DatabaseError` if the DDL or registry write fails
    pub async fn create_collection(
        &self,
        name: &str,
    ) -> Result<ProvisionOutcome, FeedServiceError> {
        if !is_valid_collection_name(name) {
            return Err(FeedServiceError::invalid_collection_name(name));
        }

        let table = CollectionTable::from_logical_name(name);
        let statements = self.table_manager.generate_collection_ddl(&table);

        let created = self.db.db_provision_collection(name, &statements).await?;

        if created {
            tracing::info!("Provisioned collection '{}' as table {}", name, table);
            Ok(ProvisionOutcome::Created)
        } else {
            tracing::debug!("Collection '{}' already provisioned", name);
            Ok(ProvisionOutcome::AlreadyExists)
        }
    }

    /// Whether `name` has been provisioned
    pub async fn has_collection(&self, name: &str) -> Result<bool, FeedServiceError> {
        Ok(self.db.db_collection_exists(name).await?)
    }

    /// All provisioned collection names
    pub async fn list_collections(&self) -> Result<Vec<String>, FeedServiceError> {
        Ok(self.db.db_list_collections().await?)
    }

    /// Resolve a logical name to its table handle
    ///
    /// # Errors
    ///
    /// `CollectionNotFound` if the name is not registered.
    pub async fn resolve(&self, name: &str) -> Result<CollectionTable, FeedServiceError> {
        if self.has_collection(name).await? {
            Ok(CollectionTable::from_logical_name(name))
        } else {
            Err(FeedServiceError::collection_not_found(name))
        }
    }
}
