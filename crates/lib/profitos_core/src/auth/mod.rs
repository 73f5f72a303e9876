//! Authentication and session lifecycle.
//!
//! Provides password hashing, refresh-token digests, TTL parsing, JWT
//! signing, the storage collaborator traits and the `SessionManager` that
//! orchestrates register / login / refresh / revoke.

pub mod email;
pub mod jwt;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod password;
pub mod queries;
pub mod session;
pub mod store;
pub mod token;
pub mod ttl;


use thiserror::Error;

pub use email::normalize_email;
pub use jwt::{JwtSigner, TokenSigner, parse_user_id_from_sub};
pub use session::{SessionManager, SessionTtls, seed_user};
pub use store::{AuthRepository, AuthTransaction, StoreError};
pub use ttl::{parse_ttl, parse_ttl_ms};

/// Convenience alias for lifecycle results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors.
///
/// Client-facing variants carry a status code and a stable code string
/// (`status_code`, `code`); the rest are internal and must be reported to
/// clients only as a generic failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("JWT_SECRET not configured")]
    ServiceNotConfigured,

    #[error("Insert failed")]
    InsertFailed,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid JWT TTL format: {0:?}")]
    InvalidTtlFormat(String),

    #[error("JWT secret must be at least {min} bytes (got {actual})")]
    SigningSecretTooShort { min: usize, actual: usize },

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status the boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::EmailAlreadyRegistered => 409,
            AuthError::InvalidCredentials
            | AuthError::InvalidOrExpiredRefreshToken
            | AuthError::InvalidToken => 401,
            AuthError::UserNotFound => 404,
            AuthError::ValidationError(_) => 400,
            AuthError::ServiceNotConfigured
            | AuthError::InsertFailed
            | AuthError::InvalidTtlFormat(_)
            | AuthError::SigningSecretTooShort { .. }
            | AuthError::TokenError(_)
            | AuthError::DbError(_)
            | AuthError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code, `None` for internal failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AuthError::EmailAlreadyRegistered => Some("EMAIL_ALREADY_REGISTERED"),
            AuthError::InvalidCredentials => Some("INVALID_CREDENTIALS"),
            AuthError::InvalidOrExpiredRefreshToken => Some("INVALID_REFRESH_TOKEN"),
            AuthError::InvalidToken => Some("INVALID_TOKEN"),
            AuthError::UserNotFound => Some("USER_NOT_FOUND"),
            AuthError::ServiceNotConfigured => Some("SERVICE_NOT_CONFIGURED"),
            AuthError::InsertFailed => Some("INSERT_FAILED"),
            AuthError::ValidationError(_) => Some("VALIDATION_ERROR"),
            _ => None,
        }
    }

    /// Whether the message may be shown to a client verbatim.
    pub fn is_client_safe(&self) -> bool {
        self.code().is_some()
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn credential_failures_share_status_and_message() {
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[test]
    fn internal_errors_have_no_code() {
        let err = AuthError::Internal("argon2 exploded".into());
        assert_eq!(err.status_code(), 500);
        assert!(err.code().is_none());
        assert!(!err.is_client_safe());
    }

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        assert_eq!(AuthError::EmailAlreadyRegistered.status_code(), 409);
        assert_eq!(AuthError::InvalidOrExpiredRefreshToken.status_code(), 401);
        assert_eq!(AuthError::InvalidToken.status_code(), 401);
        assert_eq!(AuthError::UserNotFound.status_code(), 404);
        assert_eq!(AuthError::ServiceNotConfigured.status_code(), 500);
        assert_eq!(AuthError::InsertFailed.status_code(), 500);
        assert_eq!(AuthError::InsertFailed.code(), Some("INSERT_FAILED"));
    }
}
