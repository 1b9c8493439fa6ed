use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {message}")]
    NotFound { code: &'static str, message: String },
    /// Malformed client input; `code` is a fixed machine-readable identifier.
    #[error("Bad request: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Admin endpoints are disabled")]
    AdminDisabled,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        AppError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal_error",
            AppError::NotFound { code, .. } => *code,
            AppError::BadRequest { code, .. } => *code,
            AppError::Unauthorized => "unauthorized",
            AppError::AdminDisabled => "admin_disabled",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::orchestration::ServiceError> for AppError {
    fn from(err: crate::orchestration::ServiceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message),
            AppError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid admin secret".to_string(),
            ),
            AppError::AdminDisabled => (
                StatusCode::FORBIDDEN,
                "admin endpoints are disabled".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_request_body_carries_code() {
        let resp = AppError::bad_request("invalid_season", "season must be a year").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "invalid_season");
        assert_eq!(json["error"], "season must be a year");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let resp = AppError::Internal("disk I/O error".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "internal_error");
        assert_eq!(json["error"], "internal server error");
    }
}
