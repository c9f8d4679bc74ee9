//! Feed Store Core
//!
//! Storage and query layer for per-user notification feeds. Records live in
//! named collections, each backed by its own table in an embedded libsql
//! (SQLite-compatible) database.
//!
//! # Architecture
//!
//! - **Table per collection**: `feed_data_<name>`, created on demand and
//!   tracked in the `feed_collection` registry
//! - **Keyset pagination**: listings page by record id, never by offset
//! - **Deferred badges**: mutations schedule unread-count updates on a
//!   background queue after they succeed
//!
//! # Modules
//!
//! - [`models`] - Records, insert fields, and listing filters
//! - [`db`] - libsql access: registry, DDL execution, record SQL
//! - [`services`] - Collection provisioning, record operations, badges
//! - [`handlers`] - Parameter parsing and validation for request layers
//! - [`config`] - Environment-driven configuration

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::FeedConfig;
pub use handlers::{HandlerContext, HandlerError};
pub use models::*;
pub use services::*;
