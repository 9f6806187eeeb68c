// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth flow handlers: login initiation, provider callback, logout.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use crate::auth::{oauth, pkce};
use crate::error::AppError;
use crate::session;
use crate::state::{epoch_ms, AppState};

/// Serve an HTML page that sets cookies and immediately navigates to `url`.
///
/// Cookies must ride a 200 response here: some browsers drop `Set-Cookie`
/// headers attached to a 30x redirect. Both login initiation and callback
/// completion navigate through this page.
fn navigate(jar: PrivateCookieJar, url: &str) -> Response {
    let page = format!(
        "<!DOCTYPE html><html><head><meta http-equiv=\"refresh\" content=\"0;url={url}\">\
         </head><body><a href=\"{url}\">Continue</a></body></html>"
    );
    (jar, Html(page)).into_response()
}

/// Redirect to the login page with a short error code.
fn login_error(jar: PrivateCookieJar, code: &str) -> Response {
    (jar, Redirect::to(&format!("/login?error={}", oauth::urlencode(code)))).into_response()
}

/// `GET /api/auth/login` — start the authorization code flow.
pub async fn login(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let Some(client_id) = state.config.client_id.as_deref() else {
        return AppError::ServerMisconfigured
            .to_http_response("RAILWATCH_CLIENT_ID is not configured")
            .into_response();
    };

    let oauth_state = pkce::generate_state();
    let verifier = pkce::generate_code_verifier();
    let challenge = pkce::compute_code_challenge(&verifier);

    let auth_url = pkce::build_auth_url(
        &state.config.auth_url,
        client_id,
        &state.config.redirect_uri(),
        &state.config.scopes,
        &challenge,
        &oauth_state,
    );

    let jar = session::flow_cookies(jar, &oauth_state, &verifier, state.config.secure_cookies);
    navigate(jar, &auth_url)
}

/// Query parameters of the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /api/auth/callback` — complete the authorization code flow.
pub async fn callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let stored_state = session::flow_state(&jar);
    let verifier = session::flow_verifier(&jar);
    // Single-use: the transient cookies are cleared whatever happens next.
    let jar = session::clear_flow(jar);

    if let Some(error) = &params.error {
        let description = params.error_description.as_deref().unwrap_or("");
        tracing::warn!(error = %error, description = %description, "provider denied authorization");
        return login_error(jar, error);
    }

    let (Some(code), Some(returned_state)) = (&params.code, &params.state) else {
        return login_error(jar, AppError::MissingParameters.redirect_code());
    };

    let state_matches = stored_state
        .as_deref()
        .is_some_and(|stored| constant_time_eq(stored, returned_state));
    if !state_matches {
        tracing::warn!("oauth state mismatch");
        return login_error(jar, AppError::StateMismatch.redirect_code());
    }

    let (Some(client_id), Some(client_secret)) =
        (state.config.client_id.as_deref(), state.config.client_secret.as_deref())
    else {
        return login_error(jar, AppError::ServerMisconfigured.redirect_code());
    };

    let token = match oauth::exchange_code(
        &state.http,
        &state.config.token_url,
        client_id,
        client_secret,
        code,
        &state.config.redirect_uri(),
        verifier.as_deref(),
    )
    .await
    {
        Ok(token) => token,
        Err(e) => {
            // Full detail stays in the server log; the browser only sees a code.
            tracing::error!(err = %e, "token exchange failed");
            return login_error(jar, AppError::TokenExchangeFailed.redirect_code());
        }
    };

    let record = session::SessionRecord {
        access_token: token.access_token.clone(),
        refresh_token: token.refresh_token.clone(),
        expires_at: token.expires_at(epoch_ms()),
    };
    let jar = session::save(jar, &record, state.config.secure_cookies);

    tracing::info!("oauth login completed");
    navigate(jar, "/")
}

/// `POST /api/auth/logout` — destroy the session. Idempotent.
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (session::clear(jar), Json(serde_json::json!({ "success": true })))
}

/// `GET /api/auth/logout` — destroy the session and return to login.
pub async fn logout_redirect(jar: PrivateCookieJar) -> impl IntoResponse {
    (session::clear(jar), Redirect::to("/login"))
}

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

#[cfg(test)]
#[path = "http_auth_tests.rs"]
mod tests;
