//! WebSocket messages

use common::model::stream::StreamMode;
use serde::{Deserialize, Serialize};

/// Commands a subscriber may send
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Switch the streamed instrument
    SwitchSymbol {
        /// Instrument to stream; the default symbol when omitted
        symbol: Option<String>,
    },
    /// Liveness probe
    Ping,
}

/// Server-to-subscriber envelopes
///
/// Tick frames are built by the stream manager with the same `type` /
/// `data` envelope, so every frame on the socket decodes uniformly.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake sent once on accept
    Connected {
        /// Current stream mode
        mode: StreamMode,
        /// Active instrument
        symbol: String,
        /// Whether a live connector binding exists
        feed_available: bool,
        /// Whether a live session is established
        feed_connected: bool,
    },
    /// Reply to a ping command
    Pong,
}
