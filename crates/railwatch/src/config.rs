// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the railwatch dashboard server.
#[derive(Debug, Clone, clap::Parser)]
pub struct Config {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "RAILWATCH_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8090, env = "RAILWATCH_PORT")]
    pub port: u16,

    /// Public base URL used to build the OAuth redirect URI.
    #[arg(long, default_value = "http://localhost:8090", env = "RAILWATCH_PUBLIC_URL")]
    pub public_url: String,

    /// OAuth client ID issued by the provider.
    #[arg(long, env = "RAILWATCH_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret issued by the provider.
    #[arg(long, env = "RAILWATCH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Secret used to encrypt session cookies (at least 32 characters).
    #[arg(long, env = "RAILWATCH_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Mark cookies `Secure`. Required behind HTTPS in production.
    #[arg(long, default_value_t = false, env = "RAILWATCH_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Provider authorization endpoint.
    #[arg(
        long,
        default_value = "https://backboard.railway.com/oauth/auth",
        env = "RAILWATCH_AUTH_URL"
    )]
    pub auth_url: String,

    /// Provider token endpoint.
    #[arg(
        long,
        default_value = "https://backboard.railway.com/oauth/token",
        env = "RAILWATCH_TOKEN_URL"
    )]
    pub token_url: String,

    /// Provider GraphQL API endpoint.
    #[arg(
        long,
        default_value = "https://backboard.railway.com/graphql/v2",
        env = "RAILWATCH_API_URL"
    )]
    pub api_url: String,

    /// OAuth scopes requested at login.
    #[arg(
        long,
        default_value = "openid email profile offline_access workspace:viewer",
        env = "RAILWATCH_SCOPES"
    )]
    pub scopes: String,

    /// Log tail poll interval in milliseconds.
    #[arg(long, default_value_t = 3000, env = "RAILWATCH_LOG_POLL_MS")]
    pub log_poll_ms: u64,

    /// Log entries fetched per tail poll cycle.
    #[arg(long, default_value_t = 50, env = "RAILWATCH_LOG_TAIL_LIMIT")]
    pub log_tail_limit: u32,
}

impl Config {
    pub fn log_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.log_poll_ms)
    }

    /// The callback URL registered with the provider.
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/auth/callback", self.public_url.trim_end_matches('/'))
    }
}
