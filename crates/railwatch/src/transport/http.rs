// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON API handlers for the dashboard.

use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::PrivateCookieJar;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;

use crate::auth::gate;
use crate::error::AppError;
use crate::session;
use crate::state::AppState;
use crate::upstream::client::ApiClient;
use crate::upstream::logs;
use crate::upstream::overview::flatten_overview;
use crate::upstream::tail::{spawn_log_tail, TailEvent, TailRequest};

/// Resolve the request's access token, persisting any refreshed session
/// back into the jar.
async fn bearer(state: &AppState, jar: PrivateCookieJar) -> (Option<String>, PrivateCookieJar) {
    let Some(mut record) = session::load(&jar) else {
        return (None, jar);
    };
    let before = record.clone();

    let token = gate::access_token(&state.http, &state.config, &mut record).await;
    let jar = if token.is_some() && record != before {
        session::save(jar, &record, state.config.secure_cookies)
    } else {
        jar
    };
    (token, jar)
}

/// `GET /api/overview` — flattened service status rows.
pub async fn overview(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let (token, jar) = bearer(&state, jar).await;
    let Some(token) = token else {
        return AppError::NotAuthenticated.to_http_response("Not authenticated").into_response();
    };

    let client = ApiClient::new(&state.http, &state.config.api_url, &token);
    match client.fetch_overview_graph().await {
        Ok(data) => (jar, Json(flatten_overview(&data))).into_response(),
        Err(e) => {
            tracing::error!(err = %e, "overview fetch failed");
            AppError::UpstreamError.to_http_response(e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogsPageQuery {
    #[serde(rename = "envId")]
    pub env_id: Option<String>,
    pub lines: Option<String>,
}

/// `GET /api/logs/{service_id}` — one bounded page of recent log lines.
pub async fn logs_page(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    Query(query): Query<LogsPageQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let Some(env_id) = query.env_id.filter(|v| !v.is_empty()) else {
        return AppError::BadRequest
            .to_http_response("envId query parameter is required")
            .into_response();
    };
    let limit = logs::clamp_lines(query.lines.as_deref());

    let (token, jar) = bearer(&state, jar).await;
    let Some(token) = token else {
        return AppError::NotAuthenticated.to_http_response("Not authenticated").into_response();
    };

    let client = ApiClient::new(&state.http, &state.config.api_url, &token);
    match client.fetch_log_page(&env_id, &service_id, limit).await {
        Ok(page) => {
            let lines: Vec<String> = page.iter().map(logs::format_line).collect();
            (jar, Json(serde_json::json!({ "logs": lines }))).into_response()
        }
        Err(e) => {
            tracing::error!(err = %e, "log page fetch failed");
            AppError::UpstreamError.to_http_response(e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogsStreamQuery {
    #[serde(rename = "serviceId")]
    pub service_id: Option<String>,
    #[serde(rename = "envId")]
    pub env_id: Option<String>,
}

/// `GET /api/logs/stream` — live log tail as server-sent events.
pub async fn logs_stream(
    State(state): State<AppState>,
    Query(query): Query<LogsStreamQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let (Some(service_id), Some(env_id)) = (
        query.service_id.filter(|v| !v.is_empty()),
        query.env_id.filter(|v| !v.is_empty()),
    ) else {
        return AppError::BadRequest
            .to_http_response("serviceId and envId query parameters are required")
            .into_response();
    };

    let record = session::load(&jar).unwrap_or_default();

    let cancel = state.shutdown.child_token();
    let rx = spawn_log_tail(
        state.http.clone(),
        state.config.clone(),
        record,
        TailRequest { service_id, environment_id: env_id },
        cancel.clone(),
    );

    // Dropping the stream (client disconnect) drops the guard, which cancels
    // the polling loop with it.
    let guard = cancel.drop_guard();
    let stream = ReceiverStream::new(rx).map(move |event| {
        let _ = &guard;
        Ok::<Event, Infallible>(Event::default().data(event_json(&event)))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
        .into_response()
}

fn event_json(event: &TailEvent) -> String {
    let value = match event {
        TailEvent::Connected => serde_json::json!({ "event": "connected" }),
        TailEvent::Line(line) => serde_json::json!({ "line": line }),
        TailEvent::Error(message) => serde_json::json!({ "error": message }),
    };
    value.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeployRequest {
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub environment_id: Option<String>,
}

/// `POST /api/redeploy` — trigger a redeploy of a service instance.
pub async fn redeploy(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<RedeployRequest>,
) -> Response {
    let (Some(service_id), Some(environment_id)) = (
        req.service_id.filter(|v| !v.is_empty()),
        req.environment_id.filter(|v| !v.is_empty()),
    ) else {
        return AppError::BadRequest
            .to_http_response("serviceId and environmentId are required")
            .into_response();
    };

    let (token, jar) = bearer(&state, jar).await;
    let Some(token) = token else {
        return AppError::NotAuthenticated.to_http_response("Not authenticated").into_response();
    };

    let client = ApiClient::new(&state.http, &state.config.api_url, &token);
    match client.redeploy(&service_id, &environment_id).await {
        Ok(deployment_id) => {
            tracing::info!(service = %service_id, deployment = %deployment_id, "redeploy triggered");
            (jar, Json(serde_json::json!({ "deploymentId": deployment_id }))).into_response()
        }
        Err(e) => {
            tracing::error!(err = %e, "redeploy failed");
            AppError::UpstreamError.to_http_response(e.to_string()).into_response()
        }
    }
}
