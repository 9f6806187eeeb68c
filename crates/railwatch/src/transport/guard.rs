// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session presence guard for page routes.

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::session;

/// Gate page requests on the presence of a session cookie.
///
/// Auth endpoints and the JSON API pass through; API handlers answer with
/// 401 JSON rather than a redirect. This is a presence check only: the
/// cookie is decrypted and validated wherever the session is actually read.
pub async fn guard_layer(req: Request, next: Next) -> Response {
    let path = req.uri().path();

    if path.starts_with("/api") {
        return next.run(req).await;
    }

    let has_session = has_session_cookie(req.headers());

    if !has_session && path != "/login" {
        return Redirect::to("/login").into_response();
    }
    // A logged-in user has no business on the login page.
    if has_session && path == "/login" {
        return Redirect::to("/").into_response();
    }

    next.run(req).await
}

/// Check the raw `Cookie` header for a non-empty session cookie.
fn has_session_cookie(headers: &HeaderMap) -> bool {
    let Some(raw) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    raw.split(';').any(|pair| {
        let mut parts = pair.trim().splitn(2, '=');
        parts.next() == Some(session::SESSION_COOKIE) && parts.next().is_some_and(|v| !v.is_empty())
    })
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
