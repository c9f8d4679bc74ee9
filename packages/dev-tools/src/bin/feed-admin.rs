//! Feed Store Admin Binary
//!
//! Operator tool for provisioning collections and inspecting records in a
//! feed database.
//!
//! # Usage
//!
//! ```bash
//! feed-admin provision <collection>
//! feed-admin list
//! feed-admin records <collection> [recipient] [limit]
//! feed-admin clear <collection> <recipient>
//! feed-admin rename-thread <collection> <thread> <new_thread>
//! ```
//!
//! # Environment Variables
//!
//! - `FEED_DATABASE_PATH`: Database file (default: ~/.feed/database/feed.db)
//! - `FEED_BADGES_ENABLED`: Log badge events for mutations (`1` or `true`)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::env;
use std::sync::Arc;

use feed_core::db::DatabaseService;
use feed_core::handlers::records;
use feed_core::{
    BadgeDispatcher, FeedConfig, HandlerContext, HandlerError, RecordService,
    TracingBadgeNotifier,
};
use serde_json::{json, Value};

const USAGE: &str = "usage: feed-admin <provision|list|records|clear|rename-thread> [args...]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        anyhow::bail!(USAGE);
    };

    let config = FeedConfig::from_env();
    tracing::info!("Database: {}", config.database_path.display());

    let db = Arc::new(DatabaseService::new(config.database_path.clone()).await?);
    let records = Arc::new(RecordService::new(db));
    let mut ctx = HandlerContext::new(records);

    let badge_task = if config.badges_enabled {
        let (dispatcher, task) =
            BadgeDispatcher::spawn(Arc::new(TracingBadgeNotifier), config.badge_queue_capacity);
        ctx = ctx.with_badges(dispatcher);
        Some(task)
    } else {
        None
    };

    let arg = |i: usize| args.get(i).cloned().unwrap_or_default();

    let result = match command.as_str() {
        "provision" => {
            records::handle_create_collection(&ctx, json!({ "collection": arg(1) })).await
        }
        "list" => ctx
            .records
            .collections()
            .list_collections()
            .await
            .map(|names| json!({ "collections": names }))
            .map_err(HandlerError::from),
        "records" => {
            records::handle_get_records(
                &ctx,
                json!({
                    "collection": arg(1),
                    "recipient": arg(2),
                    "limit": arg(3),
                }),
            )
            .await
        }
        "clear" => {
            records::handle_delete_records(
                &ctx,
                json!({ "collection": arg(1), "recipient": arg(2) }),
            )
            .await
        }
        "rename-thread" => {
            records::handle_rename_thread(
                &ctx,
                json!({
                    "collection": arg(1),
                    "thread": arg(2),
                    "new_thread": arg(3),
                }),
            )
            .await
        }
        other => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
    };

    // Close the badge queue so pending events are delivered before exit
    drop(ctx);
    if let Some(task) = badge_task {
        task.await?;
    }

    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            let error: Value = json!({ "code": e.code(), "message": e.to_string() });
            eprintln!("{}", serde_json::to_string_pretty(&error)?);
            anyhow::bail!("{} failed: {}", command, e)
        }
    }
}
