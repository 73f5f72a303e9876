//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use profitos_core::auth::AuthError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request caught at the boundary.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Lifecycle error from the core; status and code come from it.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Auth(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, code) = match &self {
            AppError::Validation(m) => (m.clone(), Some("VALIDATION_ERROR")),
            AppError::Unauthorized(m) => (m.clone(), Some("UNAUTHORIZED")),
            AppError::Auth(AuthError::ValidationError(m)) => {
                (m.clone(), Some("VALIDATION_ERROR"))
            }
            AppError::Auth(e) if e.is_client_safe() => (e.to_string(), e.code()),
            AppError::Auth(e) => {
                error!(error = %e, "request failed");
                ("Internal server error".to_string(), None)
            }
        };
        let body = Json(ErrorResponse {
            error: message,
            code: code.map(str::to_string),
        });
        (status, body).into_response()
    }
}
