//! # profitos_api
//!
//! HTTP API library for ProfitOS.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use http::{HeaderValue, Method, header};
use profitos_core::auth::queries::PgAuthRepository;
use profitos_core::auth::{AuthError, AuthResult, JwtSigner, SessionManager, TokenSigner};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{auth, health, profit};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool, when a database is configured.
    pub db: Option<PgPool>,
    pub config: ApiConfig,
    /// Present only when both a database and a signing secret are configured.
    pub sessions: Option<Arc<SessionManager>>,
}

impl AppState {
    /// Build state from configuration. Sessions are wired only when both the
    /// pool and `JWT_SECRET` are available.
    pub fn new(config: ApiConfig, db: Option<PgPool>) -> AuthResult<Self> {
        let sessions = match (&db, &config.jwt_secret) {
            (Some(pool), Some(secret)) => {
                let signer: Arc<dyn TokenSigner> = Arc::new(JwtSigner::new(secret.as_bytes())?);
                Some(Arc::new(SessionManager::new(
                    Arc::new(PgAuthRepository::new(pool.clone())),
                    Some(signer),
                    config.ttls,
                )))
            }
            _ => None,
        };
        Ok(Self {
            db,
            config,
            sessions,
        })
    }

    /// State around an already-built session manager, without a pool.
    pub fn with_sessions(config: ApiConfig, sessions: SessionManager) -> Self {
        Self {
            db: None,
            config,
            sessions: Some(Arc::new(sessions)),
        }
    }

    pub(crate) fn sessions(&self) -> AppResult<&SessionManager> {
        self.sessions
            .as_deref()
            .ok_or(AppError::Auth(AuthError::ServiceNotConfigured))
    }
}

/// Run embedded database migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    profitos_core::migrate::migrate(pool).await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Credentials are not allowed together with a wildcard origin.
    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let mut v1 = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready));

    if state.sessions.is_some() {
        let public = Router::new()
            .route("/auth/register", post(auth::register_handler))
            .route("/auth/login", post(auth::login_handler))
            .route("/auth/refresh", post(auth::refresh_handler))
            .route("/auth/logout", post(auth::logout_handler));

        let protected = Router::new()
            .route("/auth/me", get(auth::me_handler))
            .route("/profit/analyze", post(profit::analyze_handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::auth::require_auth,
            ));

        v1 = v1.merge(public).merge(protected);
    } else {
        info!("DATABASE_URL or JWT_SECRET not set; auth and profit routes disabled");
    }

    Router::new()
        .nest("/v1", v1)
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
