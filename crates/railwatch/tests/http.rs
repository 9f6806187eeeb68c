// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the dashboard HTTP API.
//!
//! Uses `axum_test::TestServer` for the dashboard itself and a loopback
//! axum router as a mock provider (token + GraphQL endpoints). Session
//! cookies are forged with the same `cookie` crate and key derivation the
//! server uses, so encrypted records can be seeded directly.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_test::{TestServer, TestServerConfig};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use railwatch::config::Config;
use railwatch::session::{self, SessionRecord};
use railwatch::state::{epoch_ms, AppState};
use railwatch::transport::build_router;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn test_config(provider: &str) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        public_url: "http://localhost:8090".into(),
        client_id: Some("test-client".into()),
        client_secret: Some("test-secret".into()),
        session_secret: Some(SECRET.into()),
        secure_cookies: false,
        auth_url: format!("{provider}/oauth/auth"),
        token_url: format!("{provider}/oauth/token"),
        api_url: format!("{provider}/graphql/v2"),
        scopes: "openid email profile offline_access workspace:viewer".into(),
        log_poll_ms: 3000,
        log_tail_limit: 50,
    }
}

fn test_state(config: Config) -> AppState {
    AppState::new(config, session::cookie_key(SECRET), CancellationToken::new())
}

fn test_server(state: AppState) -> anyhow::Result<TestServer> {
    let config = TestServerConfig { save_cookies: true, ..TestServerConfig::default() };
    Ok(TestServer::new_with_config(build_router(state), config)?)
}

/// No reachable provider; for tests that never leave the dashboard.
fn offline_server() -> anyhow::Result<TestServer> {
    test_server(test_state(test_config("http://127.0.0.1:1")))
}

/// Seal a session record exactly as the server's `PrivateCookieJar` would.
fn sealed_session_cookie(record: &SessionRecord) -> anyhow::Result<cookie::Cookie<'static>> {
    let key = cookie::Key::derive_from(SECRET.as_bytes());
    let mut jar = cookie::CookieJar::new();
    jar.private_mut(&key)
        .add(cookie::Cookie::new(session::SESSION_COOKIE, serde_json::to_string(record)?));
    jar.get(session::SESSION_COOKIE)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("sealed cookie missing"))
}

fn valid_record() -> SessionRecord {
    SessionRecord {
        access_token: "valid-token".into(),
        refresh_token: None,
        expires_at: epoch_ms() + 3_600_000,
    }
}

/// Extract a query parameter value out of the login page's auth URL.
fn extract_query_param(body: &str, key: &str) -> Option<String> {
    let needle = format!("{key}=");
    let start = body.find(&needle)? + needle.len();
    let rest = &body[start..];
    let end = rest.find(['&', '"', '\'']).unwrap_or(rest.len());
    Some(rest[..end].to_owned())
}

/// Mock provider: token endpoint plus a GraphQL endpoint that answers the
/// overview, logs, and redeploy documents.
async fn spawn_mock_provider() -> anyhow::Result<String> {
    let app = Router::new()
        .route("/oauth/token", post(mock_token))
        .route("/graphql/v2", post(mock_graphql));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn mock_token() -> Json<serde_json::Value> {
    Json(json!({
        "access_token": "mock-access-token",
        "refresh_token": "mock-refresh-token",
        "expires_in": 3600,
        "token_type": "Bearer"
    }))
}

async fn mock_graphql(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    let query = body["query"].as_str().unwrap_or_default();
    if query.contains("environmentLogs") {
        // Echo the requested page size so clamping is observable end to end.
        let limit = body["variables"]["beforeLimit"].as_u64().unwrap_or(0);
        Json(json!({ "data": { "environmentLogs": [
            { "message": format!("limit={limit}"), "timestamp": "2026-02-01T10:00:00Z" }
        ]}}))
    } else if query.contains("serviceInstanceRedeploy") {
        Json(json!({ "data": { "serviceInstanceRedeploy": "dep-mock-1" } }))
    } else {
        Json(json!({ "data": { "me": { "workspaces": [{
            "id": "ws-1", "name": "Acme",
            "projects": { "edges": [{ "node": {
                "id": "proj-1", "name": "shop",
                "environments": { "edges": [
                    { "node": { "id": "env-1", "name": "production" } }
                ]},
                "services": { "edges": [{ "node": {
                    "id": "svc-1", "name": "api",
                    "serviceInstances": { "edges": [{ "node": {
                        "id": "si-1", "environmentId": "env-1",
                        "latestDeployment": {
                            "id": "dep-1", "status": "SUCCESS",
                            "createdAt": "2026-02-01T09:00:00Z"
                        }
                    }}]}
                }}]}
            }}]}
        }]}}}))
    }
}

// ── OAuth flow ────────────────────────────────────────────────────────

#[tokio::test]
async fn login_sets_flow_cookies_and_navigates() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/api/auth/login").await;
    resp.assert_status_ok();

    let body = resp.text();
    assert!(body.contains("http-equiv=\"refresh\""));
    assert!(body.contains("/oauth/auth?response_type=code&"));
    assert!(body.contains("code_challenge_method=S256"));

    assert!(!resp.cookie(session::STATE_COOKIE).value().is_empty());
    assert!(!resp.cookie(session::VERIFIER_COOKIE).value().is_empty());
    Ok(())
}

#[tokio::test]
async fn login_without_client_id_is_500() -> anyhow::Result<()> {
    let mut config = test_config("http://127.0.0.1:1");
    config.client_id = None;
    let server = test_server(test_state(config))?;

    let resp = server.get("/api/auth/login").await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"], "RAILWATCH_CLIENT_ID is not configured");
    Ok(())
}

#[tokio::test]
async fn callback_with_provider_error_redirects_with_code() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/api/auth/callback?error=access_denied").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/login?error=access_denied");
    Ok(())
}

#[tokio::test]
async fn callback_without_code_or_state_redirects() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/api/auth/callback?code=abc").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/login?error=missing_params");
    Ok(())
}

#[tokio::test]
async fn callback_without_stored_state_is_state_mismatch() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/api/auth/callback?code=abc&state=xyz").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/login?error=invalid_state");
    Ok(())
}

#[tokio::test]
async fn callback_with_wrong_state_is_rejected_even_with_code() -> anyhow::Result<()> {
    let server = offline_server()?;
    // Initiate login so the state cookie is stored.
    server.get("/api/auth/login").await.assert_status_ok();

    let resp = server.get("/api/auth/callback?code=real-looking-code&state=deadbeef").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/login?error=invalid_state");

    // Flow cookies are single-use: cleared on failure too.
    assert_eq!(resp.cookie(session::STATE_COOKIE).value(), "");
    assert_eq!(resp.cookie(session::VERIFIER_COOKIE).value(), "");
    Ok(())
}

#[tokio::test]
async fn full_login_flow_then_overview() -> anyhow::Result<()> {
    let provider = spawn_mock_provider().await?;
    let server = test_server(test_state(test_config(&provider)))?;

    let login = server.get("/api/auth/login").await;
    login.assert_status_ok();
    let state_param = extract_query_param(&login.text(), "state")
        .ok_or_else(|| anyhow::anyhow!("no state in auth url"))?;

    let callback = server
        .get(&format!("/api/auth/callback?code=fake-code&state={state_param}"))
        .await;
    callback.assert_status_ok();
    assert!(callback.text().contains("url=/"));
    assert!(!callback.cookie(session::SESSION_COOKIE).value().is_empty());
    // Transient cookies cleared on success.
    assert_eq!(callback.cookie(session::STATE_COOKIE).value(), "");

    let overview = server.get("/api/overview").await;
    overview.assert_status_ok();
    let rows: Vec<serde_json::Value> = overview.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["serviceName"], "api");
    assert_eq!(rows[0]["environmentName"], "production");
    assert_eq!(rows[0]["health"], "HEALTHY");
    assert_eq!(rows[0]["railwayUrl"], "https://railway.app/project/proj-1?environmentId=env-1");
    Ok(())
}

// ── Logout ────────────────────────────────────────────────────────────

#[tokio::test]
async fn logout_without_session_is_idempotent() -> anyhow::Result<()> {
    let server = offline_server()?;

    let resp = server.post("/api/auth/logout").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(resp.cookie(session::SESSION_COOKIE).value(), "");

    // A second logout behaves identically.
    let resp = server.post("/api/auth/logout").await;
    resp.assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn logout_get_redirects_to_login() -> anyhow::Result<()> {
    let mut server = offline_server()?;
    server.add_cookie(sealed_session_cookie(&valid_record())?);

    let resp = server.get("/api/auth/logout").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/login");
    assert_eq!(resp.cookie(session::SESSION_COOKIE).value(), "");
    Ok(())
}

// ── Route guard ───────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_without_session_redirects_to_login() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/login");
    Ok(())
}

#[tokio::test]
async fn dashboard_with_session_is_served() -> anyhow::Result<()> {
    let mut server = offline_server()?;
    // Presence check only; the guard never decrypts the cookie.
    server.add_cookie(cookie::Cookie::new(session::SESSION_COOKIE, "opaque"));

    let resp = server.get("/").await;
    resp.assert_status_ok();
    assert!(resp.text().contains("Railwatch"));
    Ok(())
}

#[tokio::test]
async fn login_page_with_session_redirects_home() -> anyhow::Result<()> {
    let mut server = offline_server()?;
    server.add_cookie(cookie::Cookie::new(session::SESSION_COOKIE, "opaque"));

    let resp = server.get("/login").await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.header("location").to_str()?, "/");
    Ok(())
}

#[tokio::test]
async fn login_page_without_session_is_served() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/login").await;
    resp.assert_status_ok();
    assert!(resp.text().contains("Sign in with Railway"));
    Ok(())
}

// ── Overview ──────────────────────────────────────────────────────────

#[tokio::test]
async fn overview_without_session_is_401() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/api/overview").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body, json!({ "error": "Not authenticated" }));
    Ok(())
}

#[tokio::test]
async fn overview_with_expired_session_and_no_refresh_token_is_401() -> anyhow::Result<()> {
    let mut server = offline_server()?;
    let record = SessionRecord {
        access_token: "expired-token".into(),
        refresh_token: None,
        expires_at: 1,
    };
    server.add_cookie(sealed_session_cookie(&record)?);

    let resp = server.get("/api/overview").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body, json!({ "error": "Not authenticated" }));
    Ok(())
}

#[tokio::test]
async fn overview_upstream_failure_is_500() -> anyhow::Result<()> {
    // Valid session, but the provider API is unreachable.
    let mut server = offline_server()?;
    server.add_cookie(sealed_session_cookie(&valid_record())?);

    let resp = server.get("/api/overview").await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

// ── Logs ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn logs_without_env_id_is_400() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.get("/api/logs/svc-1").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"], "envId query parameter is required");
    Ok(())
}

#[tokio::test]
async fn logs_lines_are_clamped_in_the_upstream_request() -> anyhow::Result<()> {
    let provider = spawn_mock_provider().await?;
    let mut server = test_server(test_state(test_config(&provider)))?;
    server.add_cookie(sealed_session_cookie(&valid_record())?);

    let resp = server.get("/api/logs/svc-1?envId=env-1&lines=10000").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let logs = body["logs"].as_array().ok_or_else(|| anyhow::anyhow!("logs not an array"))?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0], "[2026-02-01T10:00:00Z] limit=500");
    Ok(())
}

#[tokio::test]
async fn stream_without_params_is_400() -> anyhow::Result<()> {
    let server = offline_server()?;

    let resp = server.get("/api/logs/stream").await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    let resp = server.get("/api/logs/stream?serviceId=svc-1").await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

// ── Redeploy ──────────────────────────────────────────────────────────

#[tokio::test]
async fn redeploy_without_fields_is_400() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server.post("/api/redeploy").json(&json!({ "serviceId": "svc-1" })).await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn redeploy_without_session_is_401() -> anyhow::Result<()> {
    let server = offline_server()?;
    let resp = server
        .post("/api/redeploy")
        .json(&json!({ "serviceId": "svc-1", "environmentId": "env-1" }))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn redeploy_returns_deployment_id() -> anyhow::Result<()> {
    let provider = spawn_mock_provider().await?;
    let mut server = test_server(test_state(test_config(&provider)))?;
    server.add_cookie(sealed_session_cookie(&valid_record())?);

    let resp = server
        .post("/api/redeploy")
        .json(&json!({ "serviceId": "svc-1", "environmentId": "env-1" }))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["deploymentId"], "dep-mock-1");
    Ok(())
}
