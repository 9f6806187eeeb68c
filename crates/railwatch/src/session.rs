// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Encrypted cookie-backed session store.
//!
//! Exactly two kinds of record live here: the long-lived session (access
//! token, refresh token, expiry) and the transient OAuth flow state (anti-CSRF
//! `state` plus PKCE verifier) that exists only between login initiation and
//! the provider callback. Both are sealed inside encrypted cookies; the
//! server keeps nothing.

use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

pub const SESSION_COOKIE: &str = "railwatch_session";
pub const STATE_COOKIE: &str = "oauth_state";
pub const VERIFIER_COOKIE: &str = "oauth_code_verifier";

const SESSION_TTL: Duration = Duration::days(7);
const FLOW_TTL: Duration = Duration::seconds(600);

/// One authenticated browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as epoch milliseconds.
    #[serde(default)]
    pub expires_at: u64,
}

impl SessionRecord {
    /// A record without an access token is equivalent to no session.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

/// Derive the cookie encryption key from the configured session secret.
///
/// The secret is validated to be at least 32 bytes at startup.
pub fn cookie_key(secret: &str) -> Key {
    Key::derive_from(secret.as_bytes())
}

/// Load the session record, if any.
///
/// Expired records are returned as-is; expiry is judged by the refresh gate,
/// which is what lets a session with a refresh token self-heal.
pub fn load(jar: &PrivateCookieJar) -> Option<SessionRecord> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let record: SessionRecord = serde_json::from_str(cookie.value()).ok()?;
    if record.is_empty() {
        return None;
    }
    Some(record)
}

/// Persist the session record into the 7-day session cookie.
pub fn save(jar: PrivateCookieJar, record: &SessionRecord, secure: bool) -> PrivateCookieJar {
    let value = serde_json::to_string(record).unwrap_or_default();
    jar.add(
        Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(SESSION_TTL)
            .build(),
    )
}

/// Remove the session cookie. Safe to call when no session exists.
pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").max_age(Duration::ZERO).build())
}

/// Store the transient state + PKCE verifier cookies for one login attempt.
pub fn flow_cookies(
    jar: PrivateCookieJar,
    state: &str,
    verifier: &str,
    secure: bool,
) -> PrivateCookieJar {
    jar.add(flow_cookie(STATE_COOKIE, state, secure)).add(flow_cookie(
        VERIFIER_COOKIE,
        verifier,
        secure,
    ))
}

fn flow_cookie(name: &'static str, value: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value.to_owned()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(FLOW_TTL)
        .build()
}

/// Read the stored anti-CSRF `state`.
pub fn flow_state(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(STATE_COOKIE).map(|c| c.value().to_owned())
}

/// Read the stored PKCE code verifier.
pub fn flow_verifier(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(VERIFIER_COOKIE).map(|c| c.value().to_owned())
}

/// Clear the transient flow cookies. Both are single-use.
pub fn clear_flow(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build((STATE_COOKIE, "")).path("/").max_age(Duration::ZERO).build())
        .remove(Cookie::build((VERIFIER_COOKIE, "")).path("/").max_age(Duration::ZERO).build())
}
