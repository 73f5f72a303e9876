//! Session lifecycle: register, login, refresh-token rotation, revocation.
//!
//! Access tokens are short-lived signed JWTs and never touch storage.
//! Refresh tokens are long-lived opaque secrets, stored only as SHA-256
//! digests and consumed exactly once: a successful `refresh` deletes the
//! presented token and issues a new one.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use super::email::normalize_email;
use super::jwt::{TokenSigner, parse_user_id_from_sub};
use super::password::{hash_password_blocking, verify_password_blocking};
use super::store::{AuthRepository, AuthTransaction, StoreError};
use super::token::{generate_refresh_token, hash_token};
use super::ttl::parse_ttl;
use super::{AuthError, AuthResult};
use crate::models::auth::{
    AccessIdentity, AuthSession, AuthUser, NewRefreshToken, NewUser, UserId, UserRecord,
};

/// Minimum password length accepted by `register`.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default access-token TTL.
pub const DEFAULT_ACCESS_TTL: &str = "15m";

/// Default refresh-token TTL.
pub const DEFAULT_REFRESH_TTL: &str = "7d";

/// Parsed token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtls {
    pub access: Duration,
    pub refresh: Duration,
}

impl SessionTtls {
    /// Parse both TTL strings. Malformed input is an error, never a default.
    pub fn parse(access: &str, refresh: &str) -> AuthResult<Self> {
        Ok(Self {
            access: parse_ttl(access)?,
            refresh: parse_ttl(refresh)?,
        })
    }
}

impl Default for SessionTtls {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
        }
    }
}

/// Orchestrates the session lifecycle over injected storage and signer.
///
/// `signer == None` means no signing secret is configured: every operation
/// that issues or verifies access tokens fails with `ServiceNotConfigured`.
#[derive(Clone)]
pub struct SessionManager {
    repo: Arc<dyn AuthRepository>,
    signer: Option<Arc<dyn TokenSigner>>,
    ttls: SessionTtls,
}

impl SessionManager {
    pub fn new(
        repo: Arc<dyn AuthRepository>,
        signer: Option<Arc<dyn TokenSigner>>,
        ttls: SessionTtls,
    ) -> Self {
        Self {
            repo,
            signer,
            ttls,
        }
    }

    pub fn ttls(&self) -> SessionTtls {
        self.ttls
    }

    /// Whether a signing secret is configured.
    pub fn is_configured(&self) -> bool {
        self.signer.is_some()
    }

    /// Storage handle, for readiness checks.
    pub fn repository(&self) -> &Arc<dyn AuthRepository> {
        &self.repo
    }

    fn signer(&self) -> AuthResult<&dyn TokenSigner> {
        self.signer.as_deref().ok_or(AuthError::ServiceNotConfigured)
    }

    /// Register a new account and open a session for it.
    pub async fn register(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let signer = self.signer()?;
        let email = normalize_email(email);
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let mut tx = self.repo.begin().await?;

        // Optimization only; the unique constraint decides.
        if tx.find_user_by_email(&email).await?.is_some() {
            debug!("register rejected: email already registered");
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;

        let user = match tx
            .insert_user(NewUser {
                email,
                password_hash: Some(password_hash),
            })
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::InsertFailed),
            Err(StoreError::UniqueViolation(constraint)) => {
                debug!(%constraint, "register lost insert race");
                return Err(AuthError::EmailAlreadyRegistered);
            }
            Err(e) => return Err(e.into()),
        };

        let refresh_token = self.issue_refresh_token_tx(tx.as_mut(), user.id).await?;
        tx.commit().await?;

        info!(user_id = user.id, "user registered");
        self.finish(signer, &user, refresh_token)
    }

    /// Authenticate with email + password.
    ///
    /// Unknown email, federated-only account and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let signer = self.signer()?;
        let email = normalize_email(email);

        let user = self.repo.find_user_by_email(&email).await?;
        let Some((user, hash)) = user.and_then(|u| {
            let hash = u.password_hash.clone()?;
            Some((u, hash))
        }) else {
            debug!("login rejected: unknown user or no password");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_blocking(password.to_string(), hash).await? {
            debug!(user_id = user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let refresh_token = self.issue_refresh_token(user.id).await?;
        info!(user_id = user.id, "user logged in");
        self.finish(signer, &user, refresh_token)
    }

    /// Exchange a refresh token for a new access + refresh pair.
    ///
    /// The presented token is consumed by a single conditional delete, so it
    /// works at most once and never after its expiry.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        let signer = self.signer()?;
        let token_hash = hash_token(refresh_token);

        let mut tx = self.repo.begin().await?;
        let Some(user_id) = tx.take_refresh_token(&token_hash, Utc::now()).await? else {
            debug!("refresh rejected: token unknown, used or expired");
            return Err(AuthError::InvalidOrExpiredRefreshToken);
        };

        let Some(user) = tx.find_user_by_id(user_id).await? else {
            // Keep the consumption: an orphaned token must not be retried.
            tx.commit().await?;
            return Err(AuthError::UserNotFound);
        };

        let new_token = self.issue_refresh_token_tx(tx.as_mut(), user.id).await?;
        tx.commit().await?;

        debug!(user_id = user.id, "session refreshed");
        self.finish(signer, &user, new_token)
    }

    /// Revoke a refresh token. Unknown or already-used tokens are not an error.
    pub async fn revoke(&self, refresh_token: &str) -> AuthResult<()> {
        let deleted = self
            .repo
            .delete_refresh_token(&hash_token(refresh_token))
            .await?;
        debug!(deleted, "refresh token revoked");
        Ok(())
    }

    /// Verify an access token and resolve its subject.
    pub fn authenticate(&self, access_token: &str) -> AuthResult<AccessIdentity> {
        let claims = self.signer()?.verify(access_token)?;
        Ok(AccessIdentity {
            user_id: parse_user_id_from_sub(&claims.sub)?,
            email: claims.email,
        })
    }

    /// Look up the user behind an authenticated request.
    pub async fn current_user(&self, user_id: UserId) -> AuthResult<AuthUser> {
        self.repo
            .find_user_by_id(user_id)
            .await?
            .map(|u| AuthUser::from(&u))
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete refresh tokens that are already past their expiry.
    pub async fn purge_expired_refresh_tokens(&self) -> AuthResult<u64> {
        let purged = self.repo.purge_expired_refresh_tokens(Utc::now()).await?;
        info!(purged, "expired refresh tokens purged");
        Ok(purged)
    }

    fn new_refresh_token(&self, user_id: UserId) -> (String, NewRefreshToken) {
        let token = generate_refresh_token();
        let record = NewRefreshToken {
            user_id,
            token_hash: hash_token(&token),
            expires_at: Utc::now() + self.ttls.refresh,
        };
        (token, record)
    }

    async fn issue_refresh_token(&self, user_id: UserId) -> AuthResult<String> {
        let (token, record) = self.new_refresh_token(user_id);
        self.repo.insert_refresh_token(record).await?;
        Ok(token)
    }

    async fn issue_refresh_token_tx(
        &self,
        tx: &mut dyn AuthTransaction,
        user_id: UserId,
    ) -> AuthResult<String> {
        let (token, record) = self.new_refresh_token(user_id);
        tx.insert_refresh_token(record).await?;
        Ok(token)
    }

    fn finish(
        &self,
        signer: &dyn TokenSigner,
        user: &UserRecord,
        refresh_token: String,
    ) -> AuthResult<AuthSession> {
        let access_token = signer.sign(user.id, &user.email, self.ttls.access)?;
        Ok(AuthSession {
            access_token,
            refresh_token,
            user: AuthUser::from(user),
        })
    }
}

/// Insert a user with a password if the email is not taken yet.
///
/// Development seeding only: no password policy is applied. Returns `false`
/// when the user already exists.
pub async fn seed_user(repo: &dyn AuthRepository, email: &str, password: &str) -> AuthResult<bool> {
    let email = normalize_email(email);
    let mut tx = repo.begin().await?;
    if tx.find_user_by_email(&email).await?.is_some() {
        return Ok(false);
    }
    let password_hash = hash_password_blocking(password.to_string()).await?;
    match tx
        .insert_user(NewUser {
            email,
            password_hash: Some(password_hash),
        })
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => return Err(AuthError::InsertFailed),
        Err(StoreError::UniqueViolation(_)) => return Ok(false),
        Err(e) => return Err(e.into()),
    }
    tx.commit().await?;
    Ok(true)
}
