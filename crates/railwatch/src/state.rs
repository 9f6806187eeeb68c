// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Shared railwatch state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared outbound HTTP client for the provider's token and API endpoints.
    pub http: reqwest::Client,
    /// Cookie encryption key derived from the session secret.
    pub key: Key,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, key: Key, shutdown: CancellationToken) -> Self {
        crate::ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { config, http, key, shutdown }
    }
}

// PrivateCookieJar extracts its key from the router state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
