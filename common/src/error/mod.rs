//! Error types for the quote bridge
//!
//! Provides a unified error type used across the bridge crates. Feed
//! failures are never process-fatal: the stream degrades to the
//! simulator instead of propagating a panic or aborting a request.

use thiserror::Error;

/// Quote bridge error type
#[derive(Debug, Error)]
pub enum Error {
    /// The live feed connector is not available at all
    #[error("Live feed unavailable")]
    FeedUnavailable,

    /// The live feed rejected the supplied credentials or endpoint
    #[error("Feed authentication failed: {0}")]
    FeedAuth(String),

    /// The requested instrument is unknown or disabled upstream
    #[error("Symbol unsupported: {0}")]
    SymbolUnsupported(String),

    /// Transient transport failure while talking to the feed
    #[error("Feed transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}
