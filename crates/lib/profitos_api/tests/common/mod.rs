//! Shared helpers for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use profitos_api::config::ApiConfig;
use profitos_api::{AppState, router};
use profitos_core::auth::memory::MemoryAuthRepository;
use profitos_core::auth::{JwtSigner, SessionManager, SessionTtls, TokenSigner};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-that-is-at-least-32-bytes";

pub fn app() -> (Router, MemoryAuthRepository) {
    let repo = MemoryAuthRepository::new();
    let signer: Arc<dyn TokenSigner> = Arc::new(JwtSigner::new(SECRET.as_bytes()).unwrap());
    let sessions = SessionManager::new(
        Arc::new(repo.clone()),
        Some(signer),
        SessionTtls::default(),
    );
    let config = ApiConfig {
        jwt_secret: Some(SECRET.into()),
        ..ApiConfig::default()
    };
    (router(AppState::with_sessions(config, sessions)), repo)
}

/// Router without database or secret: health routes only.
pub fn bare_app() -> Router {
    router(AppState::new(ApiConfig::default(), None).unwrap())
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json_bearer(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}
