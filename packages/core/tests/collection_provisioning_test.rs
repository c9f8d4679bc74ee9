//! Integration tests for collection provisioning
//!
//! Verifies idempotent and concurrent provisioning, the registry, and the
//! physical tables and indexes left behind in sqlite_master.

use anyhow::Result;
use feed_core::db::{DatabaseService, REGISTRY_TABLE};
use feed_core::{CollectionService, FeedServiceError, ProvisionOutcome};
use std::sync::Arc;
use tempfile::TempDir;

async fn create_test_env() -> Result<(CollectionService, Arc<DatabaseService>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db = Arc::new(DatabaseService::new(temp_dir.path().join("feed.db")).await?);
    Ok((CollectionService::new(db.clone()), db, temp_dir))
}

async fn count_master(db: &DatabaseService, kind: &str, name: &str) -> Result<i64> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ? AND name = ?",
            [kind, name],
        )
        .await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| anyhow::anyhow!("COUNT returned no row"))?;
    Ok(row.get::<i64>(0)?)
}

#[tokio::test]
async fn test_provision_creates_table_and_indexes() -> Result<()> {
    let (collections, db, _temp_dir) = create_test_env().await?;

    let outcome = collections.create_collection("alerts").await?;
    assert_eq!(outcome, ProvisionOutcome::Created);

    assert_eq!(count_master(&db, "table", "feed_data_alerts").await?, 1);
    for column in ["recipient", "sender", "thread", "created_at"] {
        let index = format!("feed_data_alerts_{}_i", column);
        assert_eq!(count_master(&db, "index", &index).await?, 1, "{}", index);
    }

    assert!(collections.has_collection("alerts").await?);
    Ok(())
}

#[tokio::test]
async fn test_double_provision_is_idempotent() -> Result<()> {
    let (collections, db, _temp_dir) = create_test_env().await?;

    assert_eq!(
        collections.create_collection("chat").await?,
        ProvisionOutcome::Created
    );
    assert_eq!(
        collections.create_collection("chat").await?,
        ProvisionOutcome::AlreadyExists
    );

    assert_eq!(count_master(&db, "table", "feed_data_chat").await?, 1);
    assert_eq!(collections.list_collections().await?, vec!["chat".to_string()]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_provisioning() -> Result<()> {
    let (collections, db, _temp_dir) = create_test_env().await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let collections = collections.clone();
        handles.push(tokio::spawn(async move {
            collections.create_collection("race").await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await?? == ProvisionOutcome::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(count_master(&db, "table", "feed_data_race").await?, 1);
    assert_eq!(collections.list_collections().await?, vec!["race".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_names_rejected_before_ddl() -> Result<()> {
    let (collections, db, _temp_dir) = create_test_env().await?;

    for name in ["", "Alerts", "ab!c", "chat room", "x;drop"] {
        let err = collections.create_collection(name).await.unwrap_err();
        assert!(
            matches!(err, FeedServiceError::InvalidCollectionName { .. }),
            "{}",
            name
        );
    }

    assert!(collections.list_collections().await?.is_empty());
    assert_eq!(count_master(&db, "table", "feed_data_abc").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_registry_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("feed.db");

    {
        let db = Arc::new(DatabaseService::new(path.clone()).await?);
        CollectionService::new(db).create_collection("alerts").await?;
    }

    let db = Arc::new(DatabaseService::new(path).await?);
    let collections = CollectionService::new(db.clone());
    assert!(collections.has_collection("alerts").await?);
    assert_eq!(
        collections.create_collection("alerts").await?,
        ProvisionOutcome::AlreadyExists
    );
    assert_eq!(count_master(&db, "table", REGISTRY_TABLE).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_resolve_unknown_collection() -> Result<()> {
    let (collections, _db, _temp_dir) = create_test_env().await?;

    let err = collections.resolve("ghost").await.unwrap_err();
    assert!(matches!(err, FeedServiceError::CollectionNotFound { .. }));
    assert!(err.is_not_found());
    Ok(())
}
