//! Error types for the overlap server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use overlap_core::OverlapError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    MissingTargetFile(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::MissingTargetFile(msg) => {
                (StatusCode::NOT_FOUND, "MISSING_TARGET_FILE", msg.clone())
            }
            ServerError::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_FAILED",
                msg.clone(),
            ),
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        if status.is_server_error() {
            error!(code, "{}", message);
        } else {
            warn!(code, "{}", message);
        }

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<OverlapError> for ServerError {
    fn from(err: OverlapError) -> Self {
        match err {
            err @ OverlapError::MissingTargetFile(_) => {
                ServerError::MissingTargetFile(err.to_string())
            }
            OverlapError::Extraction(msg) => ServerError::Extraction(msg),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_target_keeps_user_message() {
        let err: ServerError =
            OverlapError::MissingTargetFile(PathBuf::from("target.pdf")).into();
        assert_eq!(
            err.to_string(),
            "Target file 'target.pdf' not found. Please make sure it exists."
        );
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_mapping() {
        let extraction: ServerError = OverlapError::Extraction("bad xref".into()).into();
        assert_eq!(
            extraction.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let highlight: ServerError = OverlapError::Highlight("write failed".into()).into();
        assert_eq!(
            highlight.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let invalid = ServerError::InvalidRequest("missing 'user'".into());
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
