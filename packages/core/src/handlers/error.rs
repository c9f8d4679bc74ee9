//! Handler Error Types

use crate::services::FeedServiceError;
use thiserror::Error;

/// Errors surfaced by request handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Parameters could not be parsed into the expected shape
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A required parameter was absent or empty
    #[error("Missing required parameter: {field}")]
    MissingField { field: &'static str },

    /// The underlying service rejected the operation
    #[error(transparent)]
    Service(#[from] FeedServiceError),
}

impl HandlerError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Stable machine-readable error code for responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParams(_) => "invalid_params",
            Self::MissingField { .. } => "missing_field",
            Self::Service(err) => match err {
                FeedServiceError::InvalidCollectionName { .. } => "invalid_collection_name",
                FeedServiceError::CollectionNotFound { .. } => "collection_not_found",
                FeedServiceError::RecordNotFound { .. } => "record_not_found",
                FeedServiceError::MalformedPayload(_) => "malformed_payload",
                FeedServiceError::DatabaseError(_) => "internal_error",
            },
        }
    }
}
