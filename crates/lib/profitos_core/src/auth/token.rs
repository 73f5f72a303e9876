//! Refresh token generation and hashing.
//!
//! Refresh tokens are opaque: 32 random bytes, hex-encoded for transport.
//! Only the SHA-256 digest is stored, so a leaked table does not yield
//! usable bearer secrets.

use rand::{Rng, rng};
use sha2::{Digest, Sha256};

/// Random bytes per refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random refresh token (64 hex chars).
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hash a token for storage (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_hex_and_unique() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_deterministic_sha256() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_token("token"), hash_token("token"));
        assert_ne!(hash_token("token"), hash_token("token2"));
    }

    #[test]
    fn hash_does_not_contain_token() {
        let token = generate_refresh_token();
        let digest = hash_token(&token);
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, token);
    }
}
