//! Record Store
//!
//! Parameterized SQL over a single collection table: filtered keyset
//! listing, insert, point lookup, deletion, and read-state / thread
//! mutations. The store trusts its [`CollectionTable`] handle; checking that
//! the collection is provisioned is the service layer's job.
//!
//! # Keyset pagination
//!
//! Listings page by `id`, not by offset. The cursor comparison is coupled to
//! the sort direction: `desc` continues with `id < cursor`, `asc` with
//! `id > cursor`. Rows are ordered by `created_at` with `id` as tie-break,
//! both in the requested direction. A `search` term is matched in Rust, so
//! searched listings scan batches of rows until `limit` matches are found.

use crate::db::collection_table::CollectionTable;
use crate::db::error::DatabaseError;
use crate::db::predicate::PredicateBuilder;
use crate::db::DatabaseService;
use crate::models::{InsertedRecord, NewRecord, Record, RecordFilter};
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::params::Params;
use libsql::{Row, Value};
use std::sync::Arc;

/// Column list shared by every SELECT; `row_to_record` depends on this order
const RECORD_COLUMNS: &str =
    "\"id\", \"recipient\", \"sender\", \"thread\", \"title\", \"text\", \"image\", \"payload\", \"created_at\", \"is_read\"";

/// Storage format for `created_at`: fixed width so text order is time order
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Minimum rows fetched per round while scanning for search matches
const SEARCH_BATCH_SIZE: i64 = 200;

/// SQL access to collection tables
#[derive(Debug, Clone)]
pub struct RecordStore {
    db: Arc<DatabaseService>,
}

impl RecordStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// List records matching `filter`, ordered and limited
    ///
    /// Absent (or empty) recipient/sender/thread/search filters impose no
    /// constraint. Search matches title OR text as a case-insensitive
    /// substring under Unicode case folding, which SQLite's `LIKE` cannot
    /// do; it is applied in Rust while scanning the SQL-filtered rows in
    /// listing order.
    pub async fn list_records(
        &self,
        table: &CollectionTable,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, DatabaseError> {
        let limit = filter.effective_limit();

        let Some(needle) = filter.search.as_deref().filter(|s| !s.is_empty()) else {
            let (records, _) = self.select_page(table, filter, None, limit).await?;
            return Ok(records);
        };

        let needle = needle.to_lowercase();
        let batch_size = limit.max(SEARCH_BATCH_SIZE);
        let mut matched = Vec::new();
        let mut resume_after: Option<(String, i64)> = None;

        loop {
            let (batch, last_key) = self
                .select_page(table, filter, resume_after.as_ref(), batch_size)
                .await?;
            let exhausted = (batch.len() as i64) < batch_size;

            for record in batch {
                if matches_search(&record, &needle) {
                    matched.push(record);
                    if matched.len() as i64 == limit {
                        return Ok(matched);
                    }
                }
            }

            match last_key {
                Some(key) if !exhausted => resume_after = Some(key),
                _ => return Ok(matched),
            }
        }
    }

    /// One ordered page of rows matching every filter except `search`
    ///
    /// `resume_after` is the raw `(created_at, id)` sort key of the last row
    /// already seen; rows continue strictly after it in listing order. The
    /// sort key of the last returned row comes back alongside the records.
    async fn select_page(
        &self,
        table: &CollectionTable,
        filter: &RecordFilter,
        resume_after: Option<&(String, i64)>,
        limit: i64,
    ) -> Result<(Vec<Record>, Option<(String, i64)>), DatabaseError> {
        let op = filter.order.cursor_operator();

        let mut predicates = PredicateBuilder::new();
        predicates.eq_text("recipient", filter.recipient.as_deref());
        predicates.eq_text("sender", filter.sender.as_deref());
        if let Some(cursor) = filter.cursor {
            predicates.push(format!("\"id\" {} ?", op), [Value::Integer(cursor)]);
        }
        predicates.eq_text("thread", filter.thread.as_deref());
        if let Some(is_read) = filter.is_read {
            predicates.push("\"is_read\" = ?", [Value::Integer(i64::from(is_read))]);
        }
        if let Some((created_at, id)) = resume_after {
            predicates.push(
                format!(
                    "(\"created_at\" {op} ? OR (\"created_at\" = ? AND \"id\" {op} ?))",
                    op = op
                ),
                [
                    Value::Text(created_at.clone()),
                    Value::Text(created_at.clone()),
                    Value::Integer(*id),
                ],
            );
        }

        let (where_clause, mut params) = predicates.build();
        let direction = filter.order.as_sql();
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY \"created_at\" {}, \"id\" {} LIMIT ?",
            RECORD_COLUMNS,
            table.quoted(),
            where_clause,
            direction,
            direction
        );
        params.push(Value::Integer(limit));

        tracing::debug!(table = %table, sql = %sql, "Listing records");

        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(&sql, Params::Positional(params))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to list records in {}: {}", table, e))
            })?;

        let mut records = Vec::new();
        let mut last_key = None;
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            let record = Self::row_to_record(&row)?;
            last_key = Some((row.get::<String>(8)?, record.id));
            records.push(record);
        }

        Ok((records, last_key))
    }

    /// Insert a record and return its assigned id and timestamp
    ///
    /// The payload is serialized before anything touches the database, so a
    /// payload that cannot be serialized aborts the insert.
    pub async fn insert_record(
        &self,
        table: &CollectionTable,
        recipient: &str,
        fields: &NewRecord,
    ) -> Result<InsertedRecord, DatabaseError> {
        let payload_json = fields
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(DatabaseError::MalformedPayload)?;
        let created_at = fields.created_at.unwrap_or_else(Utc::now);

        let sql = format!(
            "INSERT INTO {} (\"recipient\", \"sender\", \"thread\", \"title\", \"text\", \"image\", \"created_at\", \"payload\")
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING \"id\", \"created_at\"",
            table.quoted()
        );

        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                &sql,
                (
                    recipient,
                    fields.sender.as_deref(),
                    fields.thread.as_deref(),
                    fields.title.as_deref(),
                    fields.text.as_deref(),
                    fields.image.as_deref(),
                    format_timestamp(&created_at),
                    payload_json,
                ),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to insert record into {}: {}", table, e))
            })?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
            .ok_or_else(|| {
                DatabaseError::sql_execution(format!("Insert into {} returned no row", table))
            })?;

        let id: i64 = row.get(0)?;
        let stored_at: String = row.get(1)?;

        Ok(InsertedRecord {
            id,
            created_at: parse_timestamp(&stored_at)?,
        })
    }

    /// Fetch one record by id
    pub async fn get_record(
        &self,
        table: &CollectionTable,
        id: i64,
    ) -> Result<Option<Record>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE \"id\" = ?",
            RECORD_COLUMNS,
            table.quoted()
        );

        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn.query(&sql, [id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to get record {} in {}: {}", id, table, e))
        })?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// Delete one record, returning the recipient it belonged to
    pub async fn delete_record(
        &self,
        table: &CollectionTable,
        id: i64,
    ) -> Result<Option<String>, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE \"id\" = ? RETURNING \"recipient\"",
            table.quoted()
        );
        self.returning_recipient(&sql, id, "delete record").await
    }

    /// Delete every record owned by `recipient`; returns the number removed
    pub async fn delete_all_by_recipient(
        &self,
        table: &CollectionTable,
        recipient: &str,
    ) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE \"recipient\" = ?", table.quoted());

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(&sql, [recipient]).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to delete records of '{}' in {}: {}",
                recipient, table, e
            ))
        })
    }

    /// Set `is_read` on one record, returning its recipient
    pub async fn set_read_state(
        &self,
        table: &CollectionTable,
        id: i64,
        is_read: bool,
    ) -> Result<Option<String>, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET \"is_read\" = {} WHERE \"id\" = ? RETURNING \"recipient\"",
            table.quoted(),
            i64::from(is_read)
        );
        self.returning_recipient(&sql, id, "update read state").await
    }

    /// Mark every record owned by `recipient` as read
    pub async fn mark_all_read(
        &self,
        table: &CollectionTable,
        recipient: &str,
    ) -> Result<u64, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET \"is_read\" = 1 WHERE \"recipient\" = ?",
            table.quoted()
        );

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(&sql, [recipient]).await.map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to mark records of '{}' read in {}: {}",
                recipient, table, e
            ))
        })
    }

    /// Repoint every record in `old_thread` to `new_thread`
    ///
    /// Returns the number of rows changed; zero is not an error.
    pub async fn rename_thread(
        &self,
        table: &CollectionTable,
        old_thread: &str,
        new_thread: &str,
    ) -> Result<u64, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET \"thread\" = ? WHERE \"thread\" = ?",
            table.quoted()
        );

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(&sql, [new_thread, old_thread])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!(
                    "Failed to rename thread '{}' in {}: {}",
                    old_thread, table, e
                ))
            })
    }

    /// Run a single-row statement ending in `RETURNING "recipient"`
    async fn returning_recipient(
        &self,
        sql: &str,
        id: i64,
        action: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn.query(sql, [id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to {} for id {}: {}", action, id, e))
        })?;

        let recipient = match rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            Some(row) => Some(row.get::<String>(0)?),
            None => None,
        };

        Ok(recipient)
    }

    /// Convert a libsql row (in [`RECORD_COLUMNS`] order) to a [`Record`]
    fn row_to_record(row: &Row) -> Result<Record, DatabaseError> {
        let payload_json: Option<String> = row.get(7)?;
        let payload = payload_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(DatabaseError::MalformedPayload)?;

        let created_at_str: String = row.get(8)?;
        let is_read: i64 = row.get(9)?;

        Ok(Record {
            id: row.get(0)?,
            recipient: row.get(1)?,
            sender: row.get(2)?,
            thread: row.get(3)?,
            title: row.get(4)?,
            text: row.get(5)?,
            image: row.get(6)?,
            payload,
            created_at: parse_timestamp(&created_at_str)?,
            is_read: is_read != 0,
        })
    }
}

/// Case-insensitive substring test against title or text
///
/// `needle` must already be lower-cased.
fn matches_search(record: &Record, needle: &str) -> bool {
    [record.title.as_deref(), record.text.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Render a timestamp in the stored `created_at` format
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp
///
/// Accepts the native microsecond format, SQLite's `CURRENT_TIMESTAMP`
/// format, and RFC 3339.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(DatabaseError::decode_failed(
        "created_at",
        format!("unrecognized timestamp '{}'", s),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
            + chrono::Duration::microseconds(42);
        let stored = format_timestamp(&at);
        assert_eq!(stored, "2024-03-09 14:05:07.000042");
        assert_eq!(parse_timestamp(&stored).unwrap(), at);
    }

    #[test]
    fn test_parse_timestamp_accepts_legacy_formats() {
        let expected = Utc.with_ymd_and_hms(2023, 12, 1, 8, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-12-01 08:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2023-12-01T08:00:00Z").unwrap(), expected);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(err.to_string().contains("created_at"));
    }

    fn titled(title: Option<&str>, text: Option<&str>) -> Record {
        Record {
            id: 1,
            recipient: "alice".to_string(),
            sender: None,
            thread: None,
            title: title.map(str::to_string),
            text: text.map(str::to_string),
            image: None,
            payload: None,
            created_at: Utc::now(),
            is_read: false,
        }
    }

    #[test]
    fn test_search_folds_unicode_case() {
        assert!(matches_search(&titled(Some("\u{c4}rger im B\u{fc}ro"), None), "\u{e4}rger"));
        assert!(matches_search(
            &titled(None, Some("\u{41f}\u{420}\u{418}\u{412}\u{415}\u{422}")),
            &"\u{43f}\u{440}\u{438}\u{432}\u{435}\u{442}".to_lowercase()
        ));
        assert!(!matches_search(&titled(Some("Lunch"), Some("noon")), "invoice"));
        assert!(!matches_search(&titled(None, None), "x"));
    }

    #[test]
    fn test_search_is_literal() {
        assert!(matches_search(&titled(Some("100% done"), None), "0%"));
        assert!(!matches_search(&titled(Some("1000 done"), None), "0%"));
    }

    #[test]
    fn test_stored_format_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }
}
