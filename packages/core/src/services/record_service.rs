//! Record Service
//!
//! Core-facing API for record reads and mutations. Every operation first
//! resolves the logical collection through the registry, so an unprovisioned
//! collection fails with `CollectionNotFound` before any SQL runs against
//! its table.
//!
//! Single-record mutations return the owning recipient so the caller can
//! schedule dependent work (an unread-count recount). Bulk mutations report
//! success even when nothing matched.

use crate::db::{CollectionTable, DatabaseService, RecordStore};
use crate::models::{InsertedRecord, NewRecord, Record, RecordFilter};
use crate::services::collection_service::CollectionService;
use crate::services::error::FeedServiceError;
use std::sync::Arc;

/// Record operations over provisioned collections
#[derive(Debug, Clone)]
pub struct RecordService {
    collections: CollectionService,
    store: RecordStore,
}

impl RecordService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            collections: CollectionService::new(db.clone()),
            store: RecordStore::new(db),
        }
    }

    /// The registry/provisioner sharing this service's database
    pub fn collections(&self) -> &CollectionService {
        &self.collections
    }

    async fn table(&self, collection: &str) -> Result<CollectionTable, FeedServiceError> {
        self.collections.resolve(collection).await
    }

    /// List records, newest first by default
    ///
    /// # Errors
    ///
    /// - `CollectionNotFound` for an unprovisioned collection
    /// - `MalformedPayload` if a stored payload is not valid JSON
    pub async fn list_records(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, FeedServiceError> {
        let table = self.table(collection).await?;
        Ok(self.store.list_records(&table, filter).await?)
    }

    /// Insert a record for `recipient`
    pub async fn insert_record(
        &self,
        collection: &str,
        recipient: &str,
        fields: &NewRecord,
    ) -> Result<InsertedRecord, FeedServiceError> {
        let table = self.table(collection).await?;
        let inserted = self.store.insert_record(&table, recipient, fields).await?;
        tracing::debug!(
            "Inserted record {} into '{}' for '{}'",
            inserted.id,
            collection,
            recipient
        );
        Ok(inserted)
    }

    /// Fetch one record
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if no record has this id.
    pub async fn get_record(&self, collection: &str, id: i64) -> Result<Record, FeedServiceError> {
        let table = self.table(collection).await?;
        self.store
            .get_record(&table, id)
            .await?
            .ok_or_else(|| FeedServiceError::record_not_found(collection, id))
    }

    /// Delete one record, returning its recipient
    pub async fn delete_record(
        &self,
        collection: &str,
        id: i64,
    ) -> Result<String, FeedServiceError> {
        let table = self.table(collection).await?;
        self.store
            .delete_record(&table, id)
            .await?
            .ok_or_else(|| FeedServiceError::record_not_found(collection, id))
    }

    /// Delete every record owned by `recipient`
    ///
    /// Returns `true` once the delete has executed, whether or not any rows
    /// matched.
    pub async fn delete_all_by_recipient(
        &self,
        collection: &str,
        recipient: &str,
    ) -> Result<bool, FeedServiceError> {
        let table = self.table(collection).await?;
        let removed = self.store.delete_all_by_recipient(&table, recipient).await?;
        tracing::debug!(
            "Deleted {} records of '{}' from '{}'",
            removed,
            recipient,
            collection
        );
        Ok(true)
    }

    /// Mark one record read, returning its recipient
    pub async fn mark_read(&self, collection: &str, id: i64) -> Result<String, FeedServiceError> {
        self.set_read_state(collection, id, true).await
    }

    /// Mark one record unread, returning its recipient
    pub async fn mark_unread(&self, collection: &str, id: i64) -> Result<String, FeedServiceError> {
        self.set_read_state(collection, id, false).await
    }

    async fn set_read_state(
        &self,
        collection: &str,
        id: i64,
        is_read: bool,
    ) -> Result<String, FeedServiceError> {
        let table = self.table(collection).await?;
        self.store
            .set_read_state(&table, id, is_read)
            .await?
            .ok_or_else(|| FeedServiceError::record_not_found(collection, id))
    }

    /// Mark every record owned by `recipient` read
    pub async fn mark_all_read(
        &self,
        collection: &str,
        recipient: &str,
    ) -> Result<(), FeedServiceError> {
        let table = self.table(collection).await?;
        self.store.mark_all_read(&table, recipient).await?;
        Ok(())
    }

    /// Move every record from `old_thread` to `new_thread`
    ///
    /// Returns the number of records changed. Zero is a valid outcome; the
    /// caller decides whether it means "not found".
    pub async fn rename_thread(
        &self,
        collection: &str,
        old_thread: &str,
        new_thread: &str,
    ) -> Result<u64, FeedServiceError> {
        let table = self.table(collection).await?;
        Ok(self
            .store
            .rename_thread(&table, old_thread, new_thread)
            .await?)
    }
}
