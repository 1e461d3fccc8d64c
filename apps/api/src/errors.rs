use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm_client::LlmError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    ModelInvocation(#[from] LlmError),

    #[error("{0}")]
    MalformedModelOutput(String),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable name of the failure kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "InvalidRequest",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Extraction(_) => "ExtractionError",
            AppError::ModelInvocation(_) => "ModelInvocationError",
            AppError::MalformedModelOutput(_) => "MalformedModelOutput",
            AppError::Storage(_) => "StorageError",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::InvalidRequest(msg) | AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Rejected analysis request [{}]: {msg}", self.kind());
            }
            AppError::ModelInvocation(e) => {
                tracing::error!("Error analyzing resume [{}/{}]: {e}", self.kind(), e.kind());
            }
            AppError::Internal(e) => {
                tracing::error!("Error analyzing resume [{}]: {e:?}", self.kind());
            }
            _ => {
                tracing::error!("Error analyzing resume [{}]: {self}", self.kind());
            }
        }

        let body = Json(json!({ "error": self.to_string() }));

        (status, body).into_response()
    }
}
