//! Liveness and readiness checks.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::warn;

use crate::AppState;
use crate::models::{HealthResponse, format_timestamp};

/// `GET /v1/health`: the process is alive.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        timestamp: format_timestamp(Utc::now()),
        db: None,
    })
}

/// `GET /v1/health/ready`: alive and able to reach the database, if any.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = if let Some(sessions) = &state.sessions {
        Some(sessions.repository().ping().await.map_err(|e| e.to_string()))
    } else if let Some(pool) = &state.db {
        Some(
            sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        )
    } else {
        None
    };

    let db = match reachable {
        None => "not_checked",
        Some(Ok(())) => "ok",
        Some(Err(e)) => {
            warn!(error = %e, "readiness check failed");
            "error"
        }
    };

    let (status, label) = if db == "error" {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        status,
        Json(HealthResponse {
            status: label.into(),
            timestamp: format_timestamp(Utc::now()),
            db: Some(db.into()),
        }),
    )
}
