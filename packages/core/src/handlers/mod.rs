//! Request Handlers
//!
//! Thin request layer over [`RecordService`]: parses flat parameter objects,
//! checks required fields, calls the service, and schedules badge
//! notifications after successful mutations.
//!
//! Transport (HTTP routing, auth) is left to the embedding application; it
//! passes each request's parameters in as a `serde_json::Value`.

pub mod error;
pub mod records;

pub use error::HandlerError;

use crate::services::{BadgeDispatcher, BadgeEvent, RecordService};
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct HandlerContext {
    pub records: Arc<RecordService>,
    /// `None` when no badge service is configured; notifications are skipped
    pub badges: Option<BadgeDispatcher>,
}

impl HandlerContext {
    pub fn new(records: Arc<RecordService>) -> Self {
        Self {
            records,
            badges: None,
        }
    }

    pub fn with_badges(mut self, badges: BadgeDispatcher) -> Self {
        self.badges = Some(badges);
        self
    }

    /// Defer a badge notification; a no-op without a dispatcher
    pub(crate) fn notify_badges(&self, event: BadgeEvent) {
        if let Some(badges) = &self.badges {
            badges.enqueue(event);
        }
    }
}
