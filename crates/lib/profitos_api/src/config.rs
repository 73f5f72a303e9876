//! API server configuration.

use std::fmt;

use profitos_core::auth::jwt::MIN_SECRET_BYTES;
use profitos_core::auth::session::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
use profitos_core::auth::{AuthError, SessionTtls};
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a port between 1 and 65535, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("JWT_SECRET must be at least {min} bytes, got {actual}")]
    SecretTooShort { min: usize, actual: usize },

    #[error("invalid token TTL: {0}")]
    InvalidTtl(#[from] AuthError),
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// PostgreSQL connection URL. Auth and profit routes need it.
    pub database_url: Option<String>,
    /// Allowed CORS origins. Empty means no cross-origin access.
    pub cors_origins: Vec<String>,
    /// JWT signing secret. Auth and profit routes need it.
    pub jwt_secret: Option<String>,
    pub ttls: SessionTtls,
    pub db_max_connections: u32,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("cors_origins", &self.cors_origins)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("ttls", &self.ttls)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            database_url: None,
            cors_origins: Vec::new(),
            jwt_secret: None,
            ttls: SessionTtls::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable             | Default   |
    /// |----------------------|-----------|
    /// | `PORT`               | `3000`    |
    /// | `HOST`               | `0.0.0.0` |
    /// | `DATABASE_URL`       | unset     |
    /// | `CORS_ORIGINS`       | empty     |
    /// | `JWT_SECRET`         | unset     |
    /// | `JWT_ACCESS_TTL`     | `15m`     |
    /// | `JWT_REFRESH_TTL`    | `7d`      |
    /// | `DB_MAX_CONNECTIONS` | `5`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads values through `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => parse_port("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "DB_MAX_CONNECTIONS",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let jwt_secret = get("JWT_SECRET");
        if let Some(secret) = &jwt_secret
            && secret.len() < MIN_SECRET_BYTES
        {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_BYTES,
                actual: secret.len(),
            });
        }

        let ttls = SessionTtls::parse(
            get("JWT_ACCESS_TTL").as_deref().unwrap_or(DEFAULT_ACCESS_TTL),
            get("JWT_REFRESH_TTL").as_deref().unwrap_or(DEFAULT_REFRESH_TTL),
        )?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            database_url: get("DATABASE_URL"),
            cors_origins: get("CORS_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default(),
            jwt_secret,
            ttls,
            db_max_connections,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(var: &'static str, raw: &str) -> Result<u16, ConfigError> {
    match raw.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ConfigError::InvalidPort {
            var,
            value: raw.to_string(),
        }),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert!(config.jwt_secret.is_none());
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.ttls.access, Duration::minutes(15));
        assert_eq!(config.ttls.refresh, Duration::days(7));
        assert_eq!(config.db_max_connections, 5);
    }

    #[test]
    fn reads_values() {
        let config = load(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("DATABASE_URL", "postgres://localhost/profitos"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("JWT_ACCESS_TTL", "30s"),
            ("JWT_REFRESH_TTL", "1h"),
            ("DB_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/profitos")
        );
        assert!(config.jwt_secret.is_some());
        assert_eq!(config.ttls.access, Duration::seconds(30));
        assert_eq!(config.ttls.refresh, Duration::hours(1));
        assert_eq!(config.db_max_connections, 12);
    }

    #[test]
    fn splits_cors_origins() {
        let config = load(&[(
            "CORS_ORIGINS",
            " http://localhost:5173 ,https://app.example.com,, ",
        )])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:5173", "https://app.example.com"]
        );
    }

    #[test]
    fn wildcard_origin_is_kept() {
        let config = load(&[("CORS_ORIGINS", "*")]).unwrap();
        assert_eq!(config.cors_origins, vec!["*"]);
    }

    #[test]
    fn empty_values_are_unset() {
        let config = load(&[("DATABASE_URL", ""), ("JWT_SECRET", "  ")]).unwrap();
        assert!(config.database_url.is_none());
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn rejects_bad_port() {
        for bad in ["0", "65536", "http", "-1"] {
            assert!(
                matches!(load(&[("PORT", bad)]), Err(ConfigError::InvalidPort { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_short_secret() {
        let err = load(&[("JWT_SECRET", "too-short")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SecretTooShort { min: 32, actual: 9 }
        ));
    }

    #[test]
    fn rejects_bad_ttl() {
        assert!(matches!(
            load(&[("JWT_REFRESH_TTL", "7 days")]),
            Err(ConfigError::InvalidTtl(_))
        ));
        assert!(matches!(
            load(&[("JWT_ACCESS_TTL", "15")]),
            Err(ConfigError::InvalidTtl(_))
        ));
    }

    #[test]
    fn rejects_zero_connections() {
        assert!(matches!(
            load(&[("DB_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[("JWT_SECRET", "0123456789abcdef0123456789abcdef")]).unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("0123456789abcdef"));
        assert!(shown.contains("<redacted>"));
    }
}
