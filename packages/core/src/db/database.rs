//! Database Connection Management
//!
//! This module provides the database connection, registry schema, and
//! provisioning primitives for the feed store using libsql.
//!
//! # Architecture
//!
//! - **Table per collection**: each logical collection owns a physical table
//!   (see [`crate::db::collection_table`])
//! - **Registry table**: `feed_collection` durably lists provisioned names
//! - **WAL mode**: Write-Ahead Logging for concurrent readers and writers
//!
//! # Database Connection Patterns
//!
//! **Use `connect_with_timeout()` in async functions.** It applies a 5-second
//! busy timeout so concurrent operations wait for the write lock instead of
//! failing immediately with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use feed_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/feed.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use chrono::Utc;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Registry of provisioned collections (logical name -> existence)
pub const REGISTRY_TABLE: &str = "feed_collection";

/// Busy timeout applied to every connection, in milliseconds
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database service for managing the libsql connection and registry schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path`
    ///
    /// This will:
    /// 1. Ensure the parent directory exists
    /// 2. Open/create the database file
    /// 3. Enable WAL mode
    /// 4. Create the collection registry table if missing
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created, the
    /// connection fails, or the registry table cannot be created.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() rather than
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize journal mode and the registry table
    ///
    /// Idempotent: safe to call against an existing database.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    name TEXT PRIMARY KEY,
                    created_at TEXT NOT NULL
                )",
                REGISTRY_TABLE
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create {} table: {}",
                REGISTRY_TABLE, e
            ))
        })?;

        Ok(())
    }

    /// Get a synchronous connection to the database
    ///
    /// Only for single-threaded code where the connection never crosses an
    /// `.await`. Async code should use [`Self::connect_with_timeout`].
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with the busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;

        Ok(conn)
    }

    //
    // COLLECTION REGISTRY
    //

    /// Run provisioning DDL and register the collection in one write transaction
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent first-time
    /// provisioning of the same collection serializes on the busy timeout rather
    /// than racing. Every statement must be `IF NOT EXISTS`.
    ///
    /// # Returns
    ///
    /// `true` when this call added the registry entry, `false` when the
    /// collection was already registered.
    pub async fn db_provision_collection(
        &self,
        logical_name: &str,
        ddl_statements: &[String],
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN IMMEDIATE", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin provisioning transaction: {}", e))
        })?;

        for statement in ddl_statements {
            if let Err(e) = conn.execute(statement, ()).await {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to provision collection '{}' ({}): {}",
                    logical_name, statement, e
                )));
            }
        }

        let inserted = match conn
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (name, created_at) VALUES (?, ?)",
                    REGISTRY_TABLE
                ),
                (logical_name, Utc::now().to_rfc3339()),
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to register collection '{}': {}",
                    logical_name, e
                )));
            }
        };

        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to commit provisioning of '{}': {}",
                logical_name, e
            )));
        }

        Ok(inserted > 0)
    }

    /// Check whether a logical collection name is registered
    pub async fn db_collection_exists(&self, logical_name: &str) -> Result<bool, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query(
                &format!("SELECT 1 FROM {} WHERE name = ? LIMIT 1", REGISTRY_TABLE),
                [logical_name],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to query collection registry: {}", e))
            })?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?;

        Ok(row.is_some())
    }

    /// All registered logical collection names, alphabetically
    pub async fn db_list_collections(&self) -> Result<Vec<String>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query(
                &format!("SELECT name FROM {} ORDER BY name ASC", REGISTRY_TABLE),
                (),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to list collections: {}", e))
            })?;

        let mut names = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            let name: String = row.get(0)?;
            names.push(name);
        }

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db_service.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_registry_table_created() {
        let temp_dir = TempDir::new().unwrap();
        let db_service = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db_service.connect().unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='feed_collection'",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let table_name: String = row.get(0).unwrap();
        assert_eq!(table_name, "feed_collection");
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let db_service = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let conn = db_service.connect().unwrap();

        let mut stmt = conn.prepare("PRAGMA journal_mode").await.unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let mode: String = row.get(0).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
    }

    #[tokio::test]
    async fn test_registry_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let db_service = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        assert!(!db_service.db_collection_exists("alerts").await.unwrap());

        let first = db_service.db_provision_collection("alerts", &[]).await.unwrap();
        let second = db_service.db_provision_collection("alerts", &[]).await.unwrap();
        assert!(first);
        assert!(!second);

        assert!(db_service.db_collection_exists("alerts").await.unwrap());
        assert_eq!(
            db_service.db_list_collections().await.unwrap(),
            vec!["alerts".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_ddl_rolls_back_registration() {
        let temp_dir = TempDir::new().unwrap();
        let db_service = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let result = db_service
            .db_provision_collection("broken", &["NOT VALID SQL".to_string()])
            .await;
        assert!(result.is_err());
        assert!(!db_service.db_collection_exists("broken").await.unwrap());
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let first = DatabaseService::new(db_path.clone()).await.unwrap();
        first.db_provision_collection("chat", &[]).await.unwrap();

        let second = DatabaseService::new(db_path).await.unwrap();
        assert!(second.db_collection_exists("chat").await.unwrap());
    }
}
