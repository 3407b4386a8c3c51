//! Error taxonomy shared by the storage engine and the request dispatcher.
//!
//! Configuration and input errors are returned to the caller before any
//! counter is touched. Out-of-range identifiers are normally skipped by the
//! dispatcher; `OutOfRange` only escapes when the engine is called directly.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::dispatcher::protocol::ErrorResponse;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Width outside {1, 2, 4, 8, 16, 32, 64}.
    #[error("unsupported bit width: {0}")]
    UnsupportedWidth(i64),

    /// A cache with this name already exists with another width.
    #[error("cache '{name}' has width {existing}, request asked for {requested}")]
    WidthMismatch {
        name: String,
        existing: u32,
        requested: u32,
    },

    #[error("unsupported operator: {0}")]
    UnknownOperator(String),

    /// Body is not valid JSON for the endpoint (missing field, negative flag value, ...).
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// SYNC needs one flag value per identifier.
    #[error("identifier/flag length mismatch: {ids} ids, {flags} flags")]
    LengthMismatch { ids: usize, flags: usize },

    #[error("identifier {id} out of range (capacity {capacity})")]
    OutOfRange { id: u64, capacity: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CacheError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
