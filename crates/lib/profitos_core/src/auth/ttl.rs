//! TTL strings (`"15m"`, `"7d"`), same format as JWT `expiresIn`.
//!
//! Grammar: `<digits><unit>` with unit one of `s`, `m`, `h`, `d`,
//! case-insensitive, surrounding whitespace allowed. Anything else is an
//! error; there is no fallback value.

use chrono::Duration;

use super::{AuthError, AuthResult};

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Parse a TTL string into milliseconds.
pub fn parse_ttl_ms(ttl: &str) -> AuthResult<u64> {
    let invalid = || AuthError::InvalidTtlFormat(ttl.to_string());

    let normalized = ttl.trim().to_ascii_lowercase();
    let unit = normalized.chars().last().ok_or_else(invalid)?;
    let digits = &normalized[..normalized.len() - unit.len_utf8()];

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let multiplier = match unit {
        's' => SECOND_MS,
        'm' => MINUTE_MS,
        'h' => HOUR_MS,
        'd' => DAY_MS,
        _ => return Err(invalid()),
    };

    let n: u64 = digits.parse().map_err(|_| invalid())?;
    n.checked_mul(multiplier).ok_or_else(invalid)
}

/// Parse a TTL string into a `chrono::Duration`.
pub fn parse_ttl(ttl: &str) -> AuthResult<Duration> {
    let ms = parse_ttl_ms(ttl)?;
    let ms = i64::try_from(ms).map_err(|_| AuthError::InvalidTtlFormat(ttl.to_string()))?;
    Duration::try_milliseconds(ms).ok_or_else(|| AuthError::InvalidTtlFormat(ttl.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_ms_for_each_unit() {
        assert_eq!(parse_ttl_ms("30s").unwrap(), 30_000);
        assert_eq!(parse_ttl_ms("15m").unwrap(), 15 * 60 * 1000);
        assert_eq!(parse_ttl_ms("24h").unwrap(), 24 * 60 * 60 * 1000);
        assert_eq!(parse_ttl_ms("7d").unwrap(), 7 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn accepts_any_case_and_surrounding_whitespace() {
        assert_eq!(parse_ttl_ms("  7D  ").unwrap(), 7 * DAY_MS);
        assert_eq!(parse_ttl_ms("\t2H\n").unwrap(), 2 * HOUR_MS);
        assert_eq!(parse_ttl_ms("0s").unwrap(), 0);
    }

    #[test]
    fn multiplies_for_every_valid_input() {
        let units = [('s', 1_000), ('m', 60_000), ('h', 3_600_000), ('d', 86_400_000)];
        for n in [0u64, 1, 9, 42, 365] {
            for (unit, mult) in units {
                let lower = format!("{n}{unit}");
                let upper = format!(" {n}{} ", unit.to_ascii_uppercase());
                assert_eq!(parse_ttl_ms(&lower).unwrap(), n * mult, "{lower}");
                assert_eq!(parse_ttl_ms(&upper).unwrap(), n * mult, "{upper}");
            }
        }
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in [
            "30days", "1 week", "invalid", "", "   ", "m", "15", "-5m", "+5m", "1.5h", "5 m",
            "5w", "5ms", "٣d",
        ] {
            let err = parse_ttl_ms(bad).unwrap_err();
            assert!(
                matches!(err, AuthError::InvalidTtlFormat(ref s) if s == bad),
                "{bad:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            parse_ttl_ms("99999999999999999999d"),
            Err(AuthError::InvalidTtlFormat(_))
        ));
        assert!(matches!(
            parse_ttl_ms("999999999999999d"),
            Err(AuthError::InvalidTtlFormat(_))
        ));
    }

    #[test]
    fn parse_ttl_returns_duration() {
        assert_eq!(parse_ttl("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::days(7));
    }
}
