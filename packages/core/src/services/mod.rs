//! Business Services
//!
//! This module contains the feed business logic:
//!
//! - `CollectionService` - provisioning and the collection registry
//! - `RecordService` - record reads and mutations over provisioned collections
//! - `SchemaTableManager` - DDL generation for collection tables
//! - `BadgeDispatcher` - deferred notifications to the unread-badge service
//!
//! Services coordinate between the database layer and callers, enforcing
//! that a collection exists before any record operation touches its table.

pub mod badge_notifier;
pub mod collection_service;
pub mod error;
pub mod record_service;
pub mod schema_table_manager;

pub use badge_notifier::{
    BadgeDispatcher, BadgeEvent, BadgeNotifier, TracingBadgeNotifier,
    DEFAULT_BADGE_QUEUE_CAPACITY,
};
pub use collection_service::{CollectionService, ProvisionOutcome};
pub use error::FeedServiceError;
pub use record_service::RecordService;
pub use schema_table_manager::SchemaTableManager;
