//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Connection management and the collection registry table
//! - Collection naming (logical name -> physical table)
//! - Parameterized record SQL over collection tables
//!
//! # Architecture
//!
//! Each collection is physically isolated in its own table named
//! `feed_data_<sanitized name>`. Table identifiers are only ever produced by
//! [`collection_table`]; record SQL receives an opaque [`CollectionTable`].

pub mod collection_table;
mod database;
mod error;
mod predicate;
mod record_store;

pub use collection_table::{physical_name, CollectionTable, TABLE_PREFIX};
pub use database::{DatabaseService, REGISTRY_TABLE};
pub use error::DatabaseError;
pub use predicate::PredicateBuilder;
pub use record_store::{format_timestamp, parse_timestamp, RecordStore};
