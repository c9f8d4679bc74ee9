//! Schema Table Manager
//!
//! Generates the DDL for a collection's physical table.
//!
//! ## Responsibilities
//!
//! - The `CREATE TABLE IF NOT EXISTS` statement matching the record layout
//! - One non-unique index each on `recipient`, `sender`, `thread`, `created_at`
//!
//! Every statement is `IF NOT EXISTS`, so replaying the full set against an
//! already-provisioned collection is a no-op.
//!
//! ## Example Usage
//!
//! ```
//! use feed_core::db::CollectionTable;
//! use feed_core::services::SchemaTableManager;
//!
//! let table = CollectionTable::from_logical_name("alerts");
//! let statements = SchemaTableManager::new().generate_collection_ddl(&table);
//! assert_eq!(statements.len(), 5);
//! assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"feed_data_alerts\""));
//! ```

use crate::db::CollectionTable;

/// Columns that receive a non-unique index
pub const INDEXED_COLUMNS: [&str; 4] = ["recipient", "sender", "thread", "created_at"];

/// Pure DDL generator for collection tables
///
/// Stateless and holds no connection; `CollectionService` executes the
/// statements inside its provisioning transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaTableManager;

impl SchemaTableManager {
    pub fn new() -> Self {
        Self
    }

    /// Table definition followed by the index definitions
    pub fn generate_collection_ddl(&self, table: &CollectionTable) -> Vec<String> {
        let mut statements = Vec::with_capacity(1 + INDEXED_COLUMNS.len());
        statements.push(self.generate_table_ddl(table));
        statements.extend(self.generate_index_ddl(table));
        statements
    }

    fn generate_table_ddl(&self, table: &CollectionTable) -> String {
        // AUTOINCREMENT: ids are never reused after deletes, keeping keyset
        // cursors monotonic
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,
                \"recipient\" TEXT NOT NULL,
                \"sender\" TEXT,
                \"thread\" TEXT,
                \"title\" TEXT,
                \"text\" TEXT,
                \"image\" TEXT,
                \"payload\" TEXT,
                \"created_at\" TEXT NOT NULL,
                \"is_read\" INTEGER NOT NULL DEFAULT 0
            )",
            table.quoted()
        )
    }

    fn generate_index_ddl(&self, table: &CollectionTable) -> Vec<String> {
        INDEXED_COLUMNS
            .iter()
            .map(|column| {
                format!(
                    "CREATE INDEX IF NOT EXISTS \"{}\" ON {} (\"{}\")",
                    table.index_name(column),
                    table.quoted(),
                    column
                )
            })
            .collect()
    }
}
