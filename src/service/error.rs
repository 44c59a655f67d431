//! Mapping of layer errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::queue::{JobError, QueueError};
use crate::storage::reader::ReaderError;
use crate::storage::schema::SchemaError;
use crate::storage::StoreError;

/// Errors returned synchronously to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<SchemaError> for ApiError {
    fn from(e: SchemaError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Full => Self::Unavailable("write queue is full".into()),
            QueueError::Closed => Self::Unavailable("server is shutting down".into()),
            QueueError::Spawn(_) | QueueError::ThreadPanic => Self::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Schema(e) => e.into(),
            StoreError::UnknownTable(_) => Self::NotFound(e.to_string()),
            StoreError::Database(_) | StoreError::Io(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<ReaderError> for ApiError {
    fn from(e: ReaderError) -> Self {
        match e {
            ReaderError::Schema(e) => e.into(),
            ReaderError::PoolCreation(_) => Self::Unavailable(e.to_string()),
            ReaderError::Database(ref db) if db.to_string().starts_with("no such table") => {
                Self::NotFound(db.to_string())
            }
            ReaderError::Database(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
