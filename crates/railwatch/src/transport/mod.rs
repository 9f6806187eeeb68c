// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport: router, route guard, OAuth flow, and API handlers.

pub mod guard;
pub mod http;
pub mod http_auth;

use axum::middleware;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Embedded dashboard and login pages.
const DASH_HTML: &str = include_str!("../web/dash.html");
const LOGIN_HTML: &str = include_str!("../web/login.html");

/// Build the axum `Router` with all dashboard routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pages
        .route("/", get(|| async { Html(DASH_HTML) }))
        .route("/login", get(|| async { Html(LOGIN_HTML) }))
        // OAuth flow
        .route("/api/auth/login", get(http_auth::login))
        .route("/api/auth/callback", get(http_auth::callback))
        .route("/api/auth/logout", get(http_auth::logout_redirect).post(http_auth::logout))
        // Dashboard API
        .route("/api/overview", get(http::overview))
        .route("/api/logs/stream", get(http::logs_stream))
        .route("/api/logs/{service_id}", get(http::logs_page))
        .route("/api/redeploy", post(http::redeploy))
        // Middleware
        .layer(middleware::from_fn(guard::guard_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
