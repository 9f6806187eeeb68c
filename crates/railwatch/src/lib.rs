// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Railwatch: deployment health dashboard for Railway workspaces.

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod transport;
pub mod upstream;

use std::sync::Once;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::state::AppState;
use crate::transport::build_router;

/// Minimum length of the session cookie secret.
const MIN_SESSION_SECRET_LEN: usize = 32;

/// Install the ring crypto provider for reqwest/rustls.
///
/// reqwest is built with `rustls-no-provider`, so a crypto provider must be
/// installed process-wide before the first `reqwest::Client` is constructed.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto_provider() {
    static CRYPTO_INIT: Once = Once::new();
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Run the dashboard server until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let secret = config
        .session_secret
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("RAILWATCH_SESSION_SECRET must be set"))?;
    if secret.len() < MIN_SESSION_SECRET_LEN {
        anyhow::bail!(
            "RAILWATCH_SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} characters"
        );
    }
    if config.client_id.is_none() || config.client_secret.is_none() {
        tracing::warn!("OAuth client credentials not configured; login will fail");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let key = session::cookie_key(secret);
    let state = AppState::new(config, key, shutdown.clone());

    tracing::info!("railwatch listening on {addr}");

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
