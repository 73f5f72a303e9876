//! Email normalization.

/// Trim surrounding whitespace and lowercase.
///
/// Applied before every user lookup or insert so that `users.email` is unique
/// case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize_email("  User@Example.com  "), "user@example.com");
        assert_eq!(
            normalize_email("AlreadyLower@test.com"),
            "alreadylower@test.com"
        );
    }

    #[test]
    fn is_idempotent() {
        for raw in ["  A@B.com ", "x@y.z", "\tMiXeD@Case.ORG\n", ""] {
            let once = normalize_email(raw);
            assert_eq!(normalize_email(&once), once);
        }
    }

    #[test]
    fn ignores_case_and_whitespace() {
        assert_eq!(normalize_email(" A@B.com "), normalize_email("a@b.com"));
    }
}
