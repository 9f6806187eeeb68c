// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token refresh gate: hands out a currently-valid access token,
//! refreshing through the provider when the stored one is near expiry.

use crate::auth::oauth;
use crate::config::Config;
use crate::session::SessionRecord;
use crate::state::epoch_ms;

/// Refresh when less than this much validity remains.
const REFRESH_MARGIN_MS: u64 = 60_000;

/// What to do with a session record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No record, or an empty access token.
    NoSession,
    /// Stored token is still comfortably valid.
    Fresh,
    /// Token is stale and the session cannot self-heal.
    NoRefreshToken,
    /// Token is stale; attempt a refresh.
    Refresh,
}

/// Classify a session record against the refresh margin.
pub fn decide(record: Option<&SessionRecord>, now_ms: u64) -> Decision {
    let Some(record) = record else {
        return Decision::NoSession;
    };
    if record.access_token.is_empty() {
        return Decision::NoSession;
    }
    if record.expires_at > now_ms + REFRESH_MARGIN_MS {
        return Decision::Fresh;
    }
    if record.refresh_token.is_none() {
        return Decision::NoRefreshToken;
    }
    Decision::Refresh
}

/// Return a usable access token for this session, refreshing in place when
/// needed.
///
/// Mutates `record` on a successful refresh; the caller persists the updated
/// record back into the session cookie. Concurrent requests under the same
/// session may both refresh; the last cookie write wins.
pub async fn access_token(
    http: &reqwest::Client,
    config: &Config,
    record: &mut SessionRecord,
) -> Option<String> {
    match decide(Some(record), epoch_ms()) {
        Decision::NoSession | Decision::NoRefreshToken => return None,
        Decision::Fresh => return Some(record.access_token.clone()),
        Decision::Refresh => {}
    }

    let (Some(client_id), Some(client_secret)) =
        (config.client_id.as_deref(), config.client_secret.as_deref())
    else {
        return None;
    };
    let refresh_token = record.refresh_token.clone()?;

    let token = match oauth::refresh_token(
        http,
        &config.token_url,
        client_id,
        client_secret,
        &refresh_token,
    )
    .await
    {
        Ok(token) => token,
        Err(e) => {
            // The stored token may still be accepted upstream; the API call
            // gives the authoritative answer.
            tracing::warn!(err = %e, "token refresh failed, using stored token");
            return Some(record.access_token.clone());
        }
    };

    record.expires_at = token.expires_at(epoch_ms());
    record.access_token = token.access_token.clone();
    // Providers may rotate the refresh token or keep the old one.
    if token.refresh_token.is_some() {
        record.refresh_token = token.refresh_token;
    }

    Some(record.access_token.clone())
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
