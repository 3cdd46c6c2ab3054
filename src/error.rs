// Request-level errors for the history endpoints and their HTTP mapping.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// `bucket_size` did not match `<positive integer><s|m|h|d>`.
    #[error("invalid bucket size: {0:?}")]
    InvalidBucket(String),

    /// Span and bucket size together would produce more buckets than allowed.
    #[error("{count} buckets requested, at most {max} allowed; use a larger bucket_size")]
    TooManyBuckets { count: i64, max: u32 },

    #[error("invalid date parameter: {0:?}")]
    InvalidDate(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl HistoryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HistoryError::InvalidBucket(_)
            | HistoryError::TooManyBuckets { .. }
            | HistoryError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            HistoryError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            HistoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HistoryError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "history request failed");
        } else {
            tracing::debug!(error = %self, "history request rejected");
        }
        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}
