//! Gateway configuration

use std::env;

use feed_engine::config::FeedCredentials;

/// Application configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listening port
    pub port: u16,
    /// Symbol streamed before any switch request
    pub default_symbol: String,
    /// Live feed credentials, absent when not configured
    pub credentials: Option<FeedCredentials>,
}

impl AppConfig {
    /// Build configuration from `PORT`, `DEFAULT_SYMBOL` and the
    /// `FEED_*` variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);
        let default_symbol = env::var("DEFAULT_SYMBOL")
            .unwrap_or_else(|_| "EURUSD".to_string())
            .to_uppercase();
        Self {
            port,
            default_symbol,
            credentials: FeedCredentials::from_env(),
        }
    }
}
