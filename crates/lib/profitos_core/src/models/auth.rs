//! Authentication domain models.
//!
//! Storage rows (`UserRecord`, `NewRefreshToken`) stay inside the core; the
//! public results of the session lifecycle are `AuthUser` and `AuthSession`,
//! built from rows by an explicit mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User ID type (`users.id`, BIGSERIAL).
pub type UserId = i64;

/// A `users` row as read from storage.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    /// `None` for federated-only accounts.
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a user. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
}

/// Input for storing an issued refresh token. Only the digest is stored.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// A `refresh_tokens` row.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// User summary returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for AuthUser {
    fn from(row: &UserRecord) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
            created_at: row.created_at,
        }
    }
}

/// Result of register / login / refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    /// Opaque bearer secret. Not retrievable again once returned.
    pub refresh_token: String,
    pub user: AuthUser,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user ID as a decimal string.
    pub sub: String,
    pub email: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Identity proven by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIdentity {
    pub user_id: UserId,
    pub email: String,
}
