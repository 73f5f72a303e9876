//! CORS headers produced from `CORS_ORIGINS`.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use profitos_api::config::ApiConfig;
use profitos_api::{AppState, router};
use tower::ServiceExt;

fn app_with_origins(origins: &str) -> axum::Router {
    let config = ApiConfig::from_lookup(|name| (name == "CORS_ORIGINS").then(|| origins.into()))
        .unwrap();
    router(AppState::new(config, None).unwrap())
}

fn health_from(origin: &str) -> Request<Body> {
    Request::builder()
        .uri("/v1/health")
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn wildcard_origin_allows_any_without_credentials() {
    let app = app_with_origins("*");
    let resp = app.oneshot(health_from("https://anywhere.example")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .is_none()
    );
}

#[tokio::test]
async fn listed_origin_is_echoed_with_credentials() {
    let app = app_with_origins("http://localhost:5173, https://app.example.com");
    let resp = app.oneshot(health_from("https://app.example.com")).await.unwrap();

    let headers = resp.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn unlisted_origin_gets_no_cors_headers() {
    let app = app_with_origins("http://localhost:5173");
    let resp = app.oneshot(health_from("https://evil.example")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
