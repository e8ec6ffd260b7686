//! Raw quote model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw bid/ask quote produced by a feed source
///
/// Transient: consumed immediately by the synthesizer, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Bid price
    pub bid: f64,
    /// Ask price
    pub ask: f64,
    /// Arrival time upstream
    pub time: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote
    pub fn new(bid: f64, ask: f64, time: DateTime<Utc>) -> Self {
        Self { bid, ask, time }
    }

    /// Arrival time as epoch milliseconds
    pub fn timestamp_ms(&self) -> i64 {
        self.time.timestamp_millis()
    }

    /// Whether both sides are finite and positive
    pub fn is_valid(&self) -> bool {
        self.bid.is_finite() && self.ask.is_finite() && self.bid > 0.0 && self.ask > 0.0
    }
}
