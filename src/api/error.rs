use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::ledger::LedgerError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid slot: {0}")]
    InvalidSlot(String),
    #[error("no data for {0}")]
    NotFound(String),
    #[error("artifact missing for record {0}")]
    MissingArtifact(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidSlot(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingArtifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidSlot(_) => "INVALID_SLOT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MissingArtifact(_) => "MISSING_ARTIFACT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(value: LedgerError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::NotFound(key) => ApiError::MissingArtifact(key),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
