//! PostgreSQL implementation of the auth storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{AuthRepository, AuthTransaction, StoreResult};
use crate::models::auth::{NewRefreshToken, NewUser, UserId, UserRecord};

const USER_COLUMNS: &str = "id, email, password_hash, google_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: Option<String>,
    google_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            google_id: row.google_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn select_user_by_email() -> String {
    format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1")
}

fn select_user_by_id() -> String {
    format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1")
}

const INSERT_REFRESH_TOKEN: &str =
    "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)";

/// Auth storage backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn begin(&self) -> StoreResult<Box<dyn AuthTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAuthTransaction { tx }))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&select_user_by_email())
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&select_user_by_id())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn insert_refresh_token(&self, token: NewRefreshToken) -> StoreResult<()> {
        sqlx::query(INSERT_REFRESH_TOKEN)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open PostgreSQL transaction. Rolled back on drop unless committed.
pub struct PgAuthTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AuthTransaction for PgAuthTransaction {
    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&select_user_by_email())
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<Option<UserRecord>> {
        let sql = format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_user_by_id(&mut self, id: UserId) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&select_user_by_id())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn take_refresh_token(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserId>> {
        // Single statement: a concurrent refresh of the same token blocks on the
        // row lock, re-evaluates after our commit and deletes nothing.
        let user_id = sqlx::query_scalar::<_, i64>(
            "DELETE FROM refresh_tokens \
             WHERE token_hash = $1 AND expires_at > $2 \
             RETURNING user_id",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user_id)
    }

    async fn insert_refresh_token(&mut self, token: NewRefreshToken) -> StoreResult<()> {
        sqlx::query(INSERT_REFRESH_TOKEN)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
