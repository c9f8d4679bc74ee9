//! Feed Record Model
//!
//! A record is one row of a collection table: a notification or message
//! addressed to a single recipient. The `payload` field is opaque to the
//! store - it is serialized to JSON text on insert and parsed back on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored feed record
///
/// # Examples
///
/// ```
/// use feed_core::models::Record;
/// use chrono::Utc;
///
/// let record = Record {
///     id: 1,
///     recipient: "user-42".to_string(),
///     sender: None,
///     thread: Some("order-17".to_string()),
///     title: Some("Order shipped".to_string()),
///     text: None,
///     image: None,
///     payload: None,
///     created_at: Utc::now(),
///     is_read: false,
/// };
///
/// let json = serde_json::to_value(&record).unwrap();
/// assert!(json.get("payload").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier, strictly increasing per collection
    pub id: i64,

    /// Owning identity; all bulk operations scope by this
    pub recipient: String,

    pub sender: Option<String>,

    /// Grouping key for bulk thread renames
    pub thread: Option<String>,

    pub title: Option<String>,

    pub text: Option<String>,

    pub image: Option<String>,

    /// Deserialized payload. `None` when the column is NULL; a stored JSON
    /// `null` comes back as `Some(Value::Null)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    /// Sort key for listings
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub is_read: bool,
}

/// Fields supplied by the caller when inserting a record
///
/// Everything except the recipient (passed separately) is optional.
/// Presence of `payload` controls serialization: `Some(Value::Null)` is
/// stored as the JSON text `null`, while `None` leaves the column NULL.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewRecord {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub payload: Option<Value>,
    /// Defaults to the insertion time when absent
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewRecord {
    /// Convenience constructor for a record with only a title and text
    pub fn with_text(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Identifier and timestamp assigned to a freshly inserted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InsertedRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Keep an explicit JSON `null` as `Some(Value::Null)`
///
/// serde maps `null` to `None` for `Option<T>` by default, which would lose
/// the distinction between "payload: null" and a missing key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
