//! Application configuration loaded from environment variables.
//!
//! Everything is optional:
//! - `MARKETWIRE_WEBSOCKET_URL`: overrides the default chart endpoint
//! - `MARKETWIRE_AUTH_TOKEN`: auth token for the streaming session
//!   (defaults to the public unauthorized token)

/// Default public chart WebSocket endpoint.
const DEFAULT_WEBSOCKET_URL: &str =
    "wss://data.tradingview.com/socket.io/websocket?from=chart%2F&type=chart";

/// Token accepted by the public endpoint for unauthenticated sessions.
const DEFAULT_AUTH_TOKEN: &str = "unauthorized_user_token";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub websocket_url: String,
    pub auth_token: String,
}

/// Loads the application configuration from environment variables.
///
/// Empty values are treated as absent and fall back to the defaults.
#[must_use]
pub fn fetch_config() -> AppConfig {
    AppConfig {
        websocket_url: non_empty_var("MARKETWIRE_WEBSOCKET_URL")
            .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string()),
        auth_token: non_empty_var("MARKETWIRE_AUTH_TOKEN")
            .unwrap_or_else(|| DEFAULT_AUTH_TOKEN.to_string()),
    }
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
