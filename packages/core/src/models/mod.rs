//! Data Models
//!
//! Plain data structures shared by the store and service layers:
//!
//! - [`Record`] - a stored feed record
//! - [`NewRecord`] / [`InsertedRecord`] - insert input and result
//! - [`RecordFilter`] / [`SortOrder`] - listing parameters

pub mod filter;
pub mod record;

pub use filter::{RecordFilter, SortOrder, DEFAULT_PAGE_SIZE};
pub use record::{InsertedRecord, NewRecord, Record};
