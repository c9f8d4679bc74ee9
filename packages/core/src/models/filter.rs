//! Record listing filters
//!
//! `RecordFilter` mirrors the flat parameter set accepted by the listing
//! operation. Every field except the collection is optional; an absent
//! field imposes no constraint.

use serde::{Deserialize, Serialize};

/// Page size used when the caller supplies no limit or a non-positive one
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Sort direction for listings
///
/// Also selects the direction of the keyset cursor comparison:
/// descending pages continue with `id < cursor`, ascending with `id > cursor`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Normalize a raw request value. Anything but exactly `asc` or `desc`
    /// (including an absent value) becomes `Desc`.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Comparison operator applied to the `id` cursor
    pub fn cursor_operator(&self) -> &'static str {
        match self {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        }
    }
}

/// Filter for listing records in one collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub thread: Option<String>,
    /// Case-insensitive substring matched against title OR text
    pub search: Option<String>,
    /// Keyset cursor: the last id seen on the previous page
    pub cursor: Option<i64>,
    pub is_read: Option<bool>,
    pub order: SortOrder,
    /// Raw requested limit; see [`RecordFilter::effective_limit`]
    pub limit: Option<i64>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = Some(thread.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn after(mut self, cursor: i64) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn is_read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requested limit, or [`DEFAULT_PAGE_SIZE`] when absent or non-positive.
    /// No upper bound is applied here.
    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_normalization() {
        assert_eq!(SortOrder::from_param(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::from_param(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("ASC")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(None), SortOrder::Desc);
    }

    #[test]
    fn test_cursor_operator_follows_order() {
        assert_eq!(SortOrder::Desc.cursor_operator(), "<");
        assert_eq!(SortOrder::Asc.cursor_operator(), ">");
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(RecordFilter::new().effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(RecordFilter::new().limit(0).effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(RecordFilter::new().limit(-3).effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(RecordFilter::new().limit(500).effective_limit(), 500);
    }
}
