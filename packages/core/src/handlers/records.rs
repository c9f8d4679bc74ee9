//! Record Handlers
//!
//! One handler per request kind. Each takes the raw parameter object,
//! validates it, delegates to [`crate::services::RecordService`], and returns
//! a JSON response body.
//!
//! Optional parameters follow request semantics: an empty string, or an `id`
//! of `0`, counts as absent. Numeric parameters may arrive as JSON numbers or
//! numeric strings.

use crate::handlers::{HandlerContext, HandlerError};
use crate::models::{NewRecord, RecordFilter, SortOrder};
use crate::services::BadgeEvent;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

/// Parameters for create_collection
#[derive(Debug, Deserialize)]
pub struct CreateCollectionParams {
    #[serde(default)]
    pub collection: Option<String>,
}

/// Parameters for get_records
#[derive(Debug, Default, Deserialize)]
pub struct GetRecordsParams {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub is_read: Option<bool>,
}

/// Parameters for insert_record
#[derive(Debug, Deserialize)]
pub struct InsertRecordParams {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(flatten)]
    pub fields: NewRecord,
}

/// Parameters addressing one record
#[derive(Debug, Deserialize)]
pub struct RecordIdParams {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
}

/// Parameters addressing every record of one recipient
#[derive(Debug, Deserialize)]
pub struct RecipientParams {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    /// Badge owner to notify instead of `recipient`
    #[serde(default)]
    pub badge_user: Option<String>,
}

/// Parameters for rename_thread
#[derive(Debug, Deserialize)]
pub struct RenameThreadParams {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default)]
    pub new_thread: Option<String>,
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, HandlerError> {
    serde_json::from_value(params)
        .map_err(|e| HandlerError::invalid_params(format!("Invalid parameters: {}", e)))
}

/// Treat `None` and `""` alike
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn require(value: Option<String>, field: &'static str) -> Result<String, HandlerError> {
    present(value).ok_or(HandlerError::missing_field(field))
}

/// Require a non-empty collection name that is provisioned
async fn validate_collection(
    ctx: &HandlerContext,
    collection: Option<String>,
) -> Result<String, HandlerError> {
    let collection = require(collection, "collection")?;
    ctx.records.collections().resolve(&collection).await?;
    Ok(collection)
}

fn require_id(id: Option<i64>) -> Result<i64, HandlerError> {
    id.filter(|id| *id != 0).ok_or(HandlerError::missing_field("id"))
}

/// Accept a JSON number, a numeric string, `null`, or `""`
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{}'", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

/// Handle create_collection request
pub async fn handle_create_collection(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    let params: CreateCollectionParams = parse_params(params)?;
    let collection = require(params.collection, "collection")?;

    let outcome = ctx
        .records
        .collections()
        .create_collection(&collection)
        .await?;

    Ok(json!({
        "collection": collection,
        "outcome": outcome,
        "success": true
    }))
}

/// Handle get_records request
pub async fn handle_get_records(ctx: &HandlerContext, params: Value) -> Result<Value, HandlerError> {
    let params: GetRecordsParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;

    let filter = RecordFilter {
        recipient: present(params.recipient),
        sender: present(params.sender),
        thread: present(params.thread),
        search: present(params.search),
        cursor: params.id.filter(|id| *id != 0),
        is_read: params.is_read,
        order: SortOrder::from_param(params.order.as_deref()),
        limit: params.limit,
    };

    let records = ctx.records.list_records(&collection, &filter).await?;

    Ok(json!({
        "records": records,
        "count": records.len()
    }))
}

/// Handle insert_record request
pub async fn handle_insert_record(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    let params: InsertRecordParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let recipient = require(params.recipient, "recipient")?;

    let inserted = ctx
        .records
        .insert_record(&collection, &recipient, &params.fields)
        .await?;

    ctx.notify_badges(BadgeEvent::recount(&collection, &recipient));

    Ok(json!({
        "id": inserted.id,
        "created_at": inserted.created_at,
        "success": true
    }))
}

/// Handle get_record request
pub async fn handle_get_record(ctx: &HandlerContext, params: Value) -> Result<Value, HandlerError> {
    let params: RecordIdParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let id = require_id(params.id)?;

    let record = ctx.records.get_record(&collection, id).await?;

    Ok(json!({ "record": record }))
}

/// Handle delete_record request
pub async fn handle_delete_record(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    let params: RecordIdParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let id = require_id(params.id)?;

    let recipient = ctx.records.delete_record(&collection, id).await?;
    ctx.notify_badges(BadgeEvent::recount(&collection, &recipient));

    Ok(json!({
        "id": id,
        "recipient": recipient,
        "success": true
    }))
}

/// Handle delete_records request (every record of one recipient)
///
/// The badge service is told to clear `badge_user`, or `recipient` when no
/// override is given.
pub async fn handle_delete_records(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    let params: RecipientParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let recipient = require(params.recipient, "recipient")?;

    let deleted = ctx
        .records
        .delete_all_by_recipient(&collection, &recipient)
        .await?;

    if deleted {
        let badge_user = present(params.badge_user).unwrap_or_else(|| recipient.clone());
        ctx.notify_badges(BadgeEvent::clear_all(&collection, badge_user));
    }

    Ok(json!({ "success": deleted }))
}

/// Handle mark_read request
pub async fn handle_mark_read(ctx: &HandlerContext, params: Value) -> Result<Value, HandlerError> {
    set_read_state(ctx, params, true).await
}

/// Handle mark_unread request
pub async fn handle_mark_unread(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    set_read_state(ctx, params, false).await
}

async fn set_read_state(
    ctx: &HandlerContext,
    params: Value,
    is_read: bool,
) -> Result<Value, HandlerError> {
    let params: RecordIdParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let id = require_id(params.id)?;

    let recipient = if is_read {
        ctx.records.mark_read(&collection, id).await?
    } else {
        ctx.records.mark_unread(&collection, id).await?
    };
    ctx.notify_badges(BadgeEvent::recount(&collection, &recipient));

    Ok(json!({
        "id": id,
        "recipient": recipient,
        "is_read": is_read,
        "success": true
    }))
}

/// Handle mark_all_read request
pub async fn handle_mark_all_read(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    let params: RecipientParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let recipient = require(params.recipient, "recipient")?;

    ctx.records.mark_all_read(&collection, &recipient).await?;
    ctx.notify_badges(BadgeEvent::recount(&collection, &recipient));

    Ok(json!({ "success": true }))
}

/// Handle rename_thread request
///
/// `status` is true only when at least one record moved; zero affected rows
/// is still a successful call.
pub async fn handle_rename_thread(
    ctx: &HandlerContext,
    params: Value,
) -> Result<Value, HandlerError> {
    let params: RenameThreadParams = parse_params(params)?;
    let collection = validate_collection(ctx, params.collection).await?;
    let thread = require(params.thread, "thread")?;
    let new_thread = require(params.new_thread, "new_thread")?;

    let affected = ctx
        .records
        .rename_thread(&collection, &thread, &new_thread)
        .await?;

    Ok(json!({
        "status": affected > 0,
        "affected": affected
    }))
}

// Include tests
#[cfg(test)]
#[path = "records_test.rs"]
mod records_test;
