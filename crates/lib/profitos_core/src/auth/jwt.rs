//! JWT access token signing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{AuthError, AuthResult};
use crate::models::auth::{AccessClaims, UserId};

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Signs and verifies access tokens.
pub trait TokenSigner: Send + Sync {
    /// Sign claims `{sub: user_id, email}` valid for `ttl`.
    fn sign(&self, user_id: UserId, email: &str, ttl: Duration) -> AuthResult<String>;

    /// Verify signature and expiry, returning the claims.
    fn verify(&self, token: &str) -> AuthResult<AccessClaims>;
}

/// HS256 signer over a server-held secret.
#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner").finish_non_exhaustive()
    }
}

impl JwtSigner {
    /// Build a signer; the secret must be at least [`MIN_SECRET_BYTES`] long.
    pub fn new(secret: &[u8]) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::SigningSecretTooShort {
                min: MIN_SECRET_BYTES,
                actual: secret.len(),
            });
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, user_id: UserId, email: &str, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    fn verify(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        decode::<AccessClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Parse the `sub` claim back into a user ID.
///
/// Surrounding whitespace is ignored and the leading run of ASCII digits is
/// used (`"99x"` → 99). No digits, or a value that does not fit, is
/// `InvalidToken`.
pub fn parse_user_id_from_sub(sub: &str) -> AuthResult<UserId> {
    let trimmed = sub.trim();
    let end = trimmed
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if end == 0 {
        return Err(AuthError::InvalidToken);
    }
    trimmed[..end]
        .parse::<UserId>()
        .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret-min-32-chars-for-testing!!";

    #[test]
    fn rejects_short_secret() {
        let err = JwtSigner::new(b"too-short").unwrap_err();
        assert!(matches!(
            err,
            AuthError::SigningSecretTooShort { min: 32, actual: 9 }
        ));
    }

    #[test]
    fn sign_then_verify() {
        let signer = JwtSigner::new(SECRET).unwrap();
        let token = signer.sign(42, "a@b.com", Duration::minutes(15)).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn expired_token_is_invalid() {
        let signer = JwtSigner::new(SECRET).unwrap();
        let token = signer.sign(1, "a@b.com", Duration::seconds(-10)).unwrap();
        assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let signer = JwtSigner::new(SECRET).unwrap();
        let other = JwtSigner::new(b"another-secret-that-is-32-bytes-long").unwrap();
        let token = other.sign(1, "a@b.com", Duration::minutes(5)).unwrap();
        assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(
            signer.verify("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn parses_valid_subjects() {
        assert_eq!(parse_user_id_from_sub("1").unwrap(), 1);
        assert_eq!(parse_user_id_from_sub("42").unwrap(), 42);
        assert_eq!(parse_user_id_from_sub(" 7 ").unwrap(), 7);
    }

    #[test]
    fn parses_leading_digits_and_ignores_rest() {
        assert_eq!(parse_user_id_from_sub("99x").unwrap(), 99);
    }

    #[test]
    fn rejects_non_numeric_subjects() {
        for bad in ["abc", "", "   ", "x99", "-1"] {
            let err = parse_user_id_from_sub(bad).unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken), "{bad:?}");
            assert_eq!(err.status_code(), 401);
        }
        assert!(matches!(
            parse_user_id_from_sub("99999999999999999999999"),
            Err(AuthError::InvalidToken)
        ));
    }
}
