//! Storage collaborator for the session lifecycle.
//!
//! `AuthRepository` covers single-statement operations; `begin` opens an
//! `AuthTransaction` for the multi-step flows (register, refresh). Dropping a
//! transaction without `commit` rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::auth::{NewRefreshToken, NewUser, UserId, UserRecord};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (SQLSTATE 23505).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            return StoreError::UniqueViolation(constraint);
        }
        StoreError::Sqlx(e)
    }
}

/// Convenience alias for storage results.
pub type StoreResult<T> = Result<T, StoreError>;

/// User and refresh-token storage.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Open a transaction.
    async fn begin(&self) -> StoreResult<Box<dyn AuthTransaction>>;

    /// Find a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Find a user by ID.
    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>>;

    /// Store a refresh token digest.
    async fn insert_refresh_token(&self, token: NewRefreshToken) -> StoreResult<()>;

    /// Delete refresh tokens matching a digest, expired or not. Returns rows deleted.
    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<u64>;

    /// Delete every refresh token that expired at or before `now`.
    async fn purge_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64>;

    /// Connectivity check.
    async fn ping(&self) -> StoreResult<()>;
}

/// Operations available inside a transaction.
#[async_trait]
pub trait AuthTransaction: Send {
    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Insert a user. `Ok(None)` means the insert returned no row.
    async fn insert_user(&mut self, user: NewUser) -> StoreResult<Option<UserRecord>>;

    async fn find_user_by_id(&mut self, id: UserId) -> StoreResult<Option<UserRecord>>;

    /// Delete the token matching `token_hash` that is still valid at `now`,
    /// returning its owner. Must be a single atomic statement.
    async fn take_refresh_token(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserId>>;

    async fn insert_refresh_token(&mut self, token: NewRefreshToken) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_stay_sqlx() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Sqlx(sqlx::Error::RowNotFound)));
    }
}
