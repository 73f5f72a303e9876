//! In-memory `AuthRepository` for tests.
//!
//! Mirrors the Postgres constraints that matter to the lifecycle: unique
//! email, conditional single-winner token consumption, rollback of
//! uncommitted transactions. Fault injection hooks simulate races that are
//! hard to produce deterministically against a real database.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::store::{AuthRepository, AuthTransaction, StoreError, StoreResult};
use crate::models::auth::{NewRefreshToken, NewUser, RefreshTokenRecord, UserId, UserRecord};

const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Default)]
struct Inner {
    users: DashMap<UserId, UserRecord>,
    by_email: DashMap<String, UserId>,
    tokens: DashMap<i64, RefreshTokenRecord>,
    next_user_id: AtomicI64,
    next_token_id: AtomicI64,
    fail_next_user_insert: AtomicBool,
    empty_next_user_insert: AtomicBool,
}

/// Shared in-memory store. Clones share state.
#[derive(Default, Clone)]
pub struct MemoryAuthRepository {
    inner: Arc<Inner>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `insert_user` fail as if a concurrent insert of the same
    /// email won the race after our existence check.
    pub fn fail_next_user_insert_with_unique_violation(&self) {
        self.inner.fail_next_user_insert.store(true, Ordering::SeqCst);
    }

    /// Make the next `insert_user` succeed without returning a row.
    pub fn return_no_row_on_next_user_insert(&self) {
        self.inner.empty_next_user_insert.store(true, Ordering::SeqCst);
    }

    /// Insert a user directly, bypassing the lifecycle.
    pub fn insert_user_row(&self, email: &str, password_hash: Option<&str>) -> UserRecord {
        let now = Utc::now();
        let row = UserRecord {
            id: self.inner.next_user_id.fetch_add(1, Ordering::SeqCst) + 1,
            email: email.to_string(),
            password_hash: password_hash.map(str::to_string),
            google_id: None,
            created_at: now,
            updated_at: now,
        };
        self.inner.by_email.insert(row.email.clone(), row.id);
        self.inner.users.insert(row.id, row.clone());
        row
    }

    /// Insert a refresh-token row directly.
    pub fn insert_token_row(&self, token: NewRefreshToken) -> i64 {
        let id = self.inner.next_token_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tokens.insert(
            id,
            RefreshTokenRecord {
                id,
                user_id: token.user_id,
                token_hash: token.token_hash,
                expires_at: token.expires_at,
                created_at: Utc::now(),
            },
        );
        id
    }

    /// Remove a user without cascading to its refresh tokens.
    pub fn remove_user_keep_tokens(&self, id: UserId) {
        if let Some((_, user)) = self.inner.users.remove(&id) {
            self.inner.by_email.remove(&user.email);
        }
    }

    pub fn user_count(&self) -> usize {
        self.inner.users.len()
    }

    pub fn token_count(&self) -> usize {
        self.inner.tokens.len()
    }

    /// Refresh-token rows owned by `user_id`.
    pub fn tokens_for(&self, user_id: UserId) -> Vec<RefreshTokenRecord> {
        self.inner
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.value().clone())
            .collect()
    }

    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let id = *self.inner.by_email.get(email)?;
        self.inner.users.get(&id).map(|u| u.value().clone())
    }

    fn find_by_id(&self, id: UserId) -> Option<UserRecord> {
        self.inner.users.get(&id).map(|u| u.value().clone())
    }
}

#[async_trait]
impl AuthRepository for MemoryAuthRepository {
    async fn begin(&self) -> StoreResult<Box<dyn AuthTransaction>> {
        Ok(Box::new(MemoryAuthTransaction {
            repo: self.clone(),
            inserted_users: Vec::new(),
            inserted_tokens: Vec::new(),
            taken_tokens: Vec::new(),
            committed: false,
        }))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.find_by_email(email))
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        Ok(self.find_by_id(id))
    }

    async fn insert_refresh_token(&self, token: NewRefreshToken) -> StoreResult<()> {
        self.insert_token_row(token);
        Ok(())
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<u64> {
        let before = self.inner.tokens.len();
        self.inner.tokens.retain(|_, t| t.token_hash != token_hash);
        Ok((before - self.inner.tokens.len()) as u64)
    }

    async fn purge_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let before = self.inner.tokens.len();
        self.inner.tokens.retain(|_, t| t.expires_at > now);
        Ok((before - self.inner.tokens.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Write-through transaction with an undo log applied on drop.
pub struct MemoryAuthTransaction {
    repo: MemoryAuthRepository,
    inserted_users: Vec<UserId>,
    inserted_tokens: Vec<i64>,
    taken_tokens: Vec<RefreshTokenRecord>,
    committed: bool,
}

#[async_trait]
impl AuthTransaction for MemoryAuthTransaction {
    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.repo.find_by_email(email))
    }

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<Option<UserRecord>> {
        let inner = &self.repo.inner;
        if inner.fail_next_user_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::UniqueViolation(EMAIL_CONSTRAINT.into()));
        }

        let id = match inner.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::UniqueViolation(EMAIL_CONSTRAINT.into()));
            }
            Entry::Vacant(slot) => {
                let id = inner.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(id);
                id
            }
        };

        let now = Utc::now();
        let row = UserRecord {
            id,
            email: user.email,
            password_hash: user.password_hash,
            google_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, row.clone());
        self.inserted_users.push(id);

        if inner.empty_next_user_insert.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(row))
    }

    async fn find_user_by_id(&mut self, id: UserId) -> StoreResult<Option<UserRecord>> {
        Ok(self.repo.find_by_id(id))
    }

    async fn take_refresh_token(
        &mut self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserId>> {
        let tokens = &self.repo.inner.tokens;
        let candidate = tokens
            .iter()
            .find(|t| t.token_hash == token_hash && t.expires_at > now)
            .map(|t| *t.key());
        let Some(id) = candidate else {
            return Ok(None);
        };
        // remove_if is the single-winner step.
        match tokens.remove_if(&id, |_, t| t.expires_at > now) {
            Some((_, row)) => {
                let user_id = row.user_id;
                self.taken_tokens.push(row);
                Ok(Some(user_id))
            }
            None => Ok(None),
        }
    }

    async fn insert_refresh_token(&mut self, token: NewRefreshToken) -> StoreResult<()> {
        let id = self.repo.insert_token_row(token);
        self.inserted_tokens.push(id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = self;
        this.committed = true;
        Ok(())
    }
}

impl Drop for MemoryAuthTransaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let inner = &self.repo.inner;
        for id in self.inserted_tokens.drain(..) {
            inner.tokens.remove(&id);
        }
        for row in self.taken_tokens.drain(..) {
            inner.tokens.insert(row.id, row);
        }
        for id in self.inserted_users.drain(..) {
            if let Some((_, user)) = inner.users.remove(&id) {
                inner.by_email.remove(&user.email);
            }
        }
    }
}
