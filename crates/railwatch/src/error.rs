// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for the dashboard API and the OAuth flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    /// The provider rejected the authorization request.
    ProviderDenied,
    /// Callback arrived without `code` or `state`.
    MissingParameters,
    /// Returned `state` does not match the stored one (possible CSRF).
    StateMismatch,
    /// OAuth client credentials or the session secret are not configured.
    ServerMisconfigured,
    /// The token endpoint rejected the code exchange.
    TokenExchangeFailed,
    /// No usable access token for an API call.
    NotAuthenticated,
    /// Session present but expired with no way to refresh it.
    SessionExpired,
    /// The provider API returned an application-level error.
    UpstreamError,
    /// Caller input error.
    BadRequest,
}

impl AppError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ProviderDenied | Self::NotAuthenticated | Self::SessionExpired => 401,
            Self::MissingParameters | Self::StateMismatch | Self::BadRequest => 400,
            Self::ServerMisconfigured | Self::TokenExchangeFailed | Self::UpstreamError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderDenied => "PROVIDER_DENIED",
            Self::MissingParameters => "MISSING_PARAMETERS",
            Self::StateMismatch => "STATE_MISMATCH",
            Self::ServerMisconfigured => "SERVER_MISCONFIGURED",
            Self::TokenExchangeFailed => "TOKEN_EXCHANGE_FAILED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::BadRequest => "BAD_REQUEST",
        }
    }

    /// Short code appended to the login redirect on auth-phase failures.
    ///
    /// `ProviderDenied` passes the provider's own error code through at the
    /// call site instead.
    pub fn redirect_code(&self) -> &'static str {
        match self {
            Self::ProviderDenied => "access_denied",
            Self::MissingParameters => "missing_params",
            Self::StateMismatch => "invalid_state",
            Self::ServerMisconfigured => "server_config",
            Self::TokenExchangeFailed => "token_exchange",
            _ => "auth_failed",
        }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: message.into() }))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat error body: `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
