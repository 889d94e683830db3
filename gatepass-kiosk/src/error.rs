//! HTTP error type for gatepass-kiosk
//!
//! Every handler returns `ApiResult<T>`; failures render as
//! `{"error": {"code", "message"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::capture::CaptureError;
use crate::submission::SubmitError;
use crate::sync::SyncError;
use crate::types::StorageError;
use crate::wizard::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid signed-URL token (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409), e.g. a submission already in flight
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request understood but the data fails validation (422)
    #[error("{0}")]
    Unprocessable(String),

    /// A downstream dependency failed (502)
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Common error: {0}")]
    Common(#[from] gatepass_common::Error),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadySubmitted | SessionError::SubmissionInFlight => {
                ApiError::Conflict(err.to_string())
            }
            SessionError::UnknownQuestion(_)
            | SessionError::UnknownNorm(_)
            | SessionError::SectionOutOfRange(_) => ApiError::NotFound(err.to_string()),
            SessionError::Capture(e) => ApiError::Capture(e),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::UnknownEntry(_) => ApiError::NotFound(err.to_string()),
            SyncError::MutationInFlight(_) => ApiError::Conflict(err.to_string()),
            SyncError::Store(e @ gatepass_common::Error::VisitNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
            SyncError::Store(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Incomplete(_) | SubmitError::InvalidAsset(_) => {
                ApiError::Unprocessable(err.user_message())
            }
            SubmitError::Storage(_) | SubmitError::Persistence(_) => {
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => ApiError::NotFound(path),
            StorageError::InvalidPath(path) => ApiError::BadRequest(format!("Invalid path: {}", path)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED", msg)
            }
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Capture(ref err) => {
                let code = match err {
                    CaptureError::Unsupported => "CAMERA_UNSUPPORTED",
                    CaptureError::InsecureContext => "CAMERA_INSECURE_CONTEXT",
                    CaptureError::PermissionDenied => "CAMERA_PERMISSION_DENIED",
                    CaptureError::NoDevice => "CAMERA_NOT_FOUND",
                    CaptureError::Device(_) => "CAMERA_ERROR",
                    CaptureError::NotActive => "CAMERA_NOT_ACTIVE",
                    CaptureError::Encode(_) => "CAMERA_ENCODE_FAILED",
                };
                (StatusCode::CONFLICT, code, err.to_string())
            }
            ApiError::Common(ref err @ gatepass_common::Error::VisitNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            ApiError::Common(ref err @ gatepass_common::Error::Locked { .. }) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_BUSY",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
