use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// Unsupported or unparsable upload. The real cause is logged at the
    /// loader boundary; clients only see this generic message.
    #[error("Invalid file format. Please upload a valid CSV or XES file.")]
    InvalidFormat,

    /// The fatal variant of column detection: no case/activity binding.
    #[error("Missing essential columns (case/activity). Please check the data format.")]
    MissingColumns,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convenience type alias
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            ApiError::InvalidFormat => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_FORMAT"),
            ApiError::MissingColumns => (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_COLUMNS"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Internal detail stays in the server log, never in the body.
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses() {
        assert_eq!(
            ApiError::SessionNotFound(uuid::Uuid::nil()).status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidFormat.status_and_code().1,
            "INVALID_FORMAT"
        );
        assert_eq!(
            ApiError::MissingColumns.status_and_code().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_internal_detail_is_sanitized() {
        let response = ApiError::Internal("connection string leaked".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
