//! # profitos_core
//!
//! Core domain logic for ProfitOS: the authentication session lifecycle
//! and the profit calculator. Nothing in here knows about HTTP.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod profit;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
