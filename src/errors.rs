use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Unified error type for services, handlers, and queue jobs.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Inbound message body is missing required keys or carries values that
    /// cannot be parsed. Retryable: it usually signals an integration bug
    /// that must surface, not a poison message to discard.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// An external id on an inbound message matched no local record. The
    /// referenced record may simply not have been committed yet, so the
    /// queue is expected to retry.
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Whether the queue worker should re-deliver the failed job. The
    /// permanent categories surface as validation errors instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::MalformedMessage(_)
            | Self::ReferenceNotFound(_)
            | Self::DatabaseError(_)
            | Self::ExternalServiceError(_)
            | Self::QueueError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => true,
            Self::NotFound(_)
            | Self::ValidationError(_)
            | Self::InvalidOperation(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::BadRequest(_) => false,
        }
    }

    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::ReferenceNotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidOperation(_)
            | Self::MalformedMessage(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_)
            | Self::QueueError(_)
            | Self::EventError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal errors return generic messages to avoid leaking details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::QueueError(_) | Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Standard error body for HTTP responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_split_matches_queue_contract() {
        assert!(ServiceError::MalformedMessage("x".into()).is_retryable());
        assert!(ServiceError::ReferenceNotFound("x".into()).is_retryable());
        assert!(ServiceError::ExternalServiceError("x".into()).is_retryable());
        assert!(!ServiceError::InvalidOperation("x".into()).is_retryable());
        assert!(!ServiceError::ValidationError("x".into()).is_retryable());
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::MalformedMessage("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::ReferenceNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        assert_eq!(
            ServiceError::QueueError("broker gone".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::NotFound("order 4".into()).response_message(),
            "Not found: order 4"
        );
    }
}
