//! Password hashing via Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters. Neither the plaintext nor the hash is ever logged.

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::{AuthError, AuthResult};

/// Hash a password with Argon2id (default parameters, random salt).
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("argon2 hash: {e}")))
}

/// Verify a password against an Argon2 PHC hash.
///
/// Returns `Ok(false)` on mismatch; a hash that cannot be parsed is an
/// internal error, not a credential failure.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| AuthError::Internal(format!("argon2 parse: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Internal(format!("argon2 verify: {e}"))),
    }
}

/// `hash_password` on the blocking pool.
pub async fn hash_password_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
}

/// `verify_password` on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("verify task: {e}")))?
}
