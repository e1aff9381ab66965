#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use jqlgate_api::auth::jwt::JwtConfig;
use jqlgate_api::config::{DeploymentMode, ServerConfig};
use jqlgate_api::middleware::rate_limit::RateLimitConfig;
use jqlgate_api::router::build_app_router;
use jqlgate_api::state::AppState;
use jqlgate_jira::JiraTimeouts;

pub const TEST_SECRET: &str = "integration-test-secret-long-enough-for-hmac";

pub fn test_jwt() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        expiry_hours: 24,
    }
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Runs in production mode so the CORS allow-list is enforced, with
/// `http://localhost:3000` as the only listed origin.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        mode: DeploymentMode::Production,
        cors_origins: vec!["http://localhost:3000".to_string()],
        cors_allow_private_network: true,
        request_timeout_secs: 30,
        body_limit_bytes: 10 * 1024 * 1024,
        jwt: test_jwt(),
        jira_timeouts: JiraTimeouts::default(),
        rate_limit: RateLimitConfig::default(),
    }
}

/// Build the full application router, exactly as `main.rs` does.
pub fn build_test_app() -> Router {
    build_test_app_with_config(test_config())
}

pub fn build_test_app_with_config(config: ServerConfig) -> Router {
    build_app_router(AppState::from_config(config).unwrap())
}

/// Same as [`build_test_app`] with custom outbound Jira timeouts.
pub fn build_test_app_with_timeouts(timeouts: JiraTimeouts) -> Router {
    build_test_app_with_config(ServerConfig {
        jira_timeouts: timeouts,
        ..test_config()
    })
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// Register a user and return the session token.
pub async fn register(app: Router, name: &str, email: &str, password: &str) -> String {
    let body = serde_json::json!({ "name": name, "email": email, "password": password });
    let response = post_json(app, "/api/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Jira timeouts short enough for tests that exercise the timeout path.
pub fn short_timeouts() -> JiraTimeouts {
    JiraTimeouts {
        metadata: Duration::from_millis(300),
        search: Duration::from_millis(300),
    }
}
