//! Synthesized tick model

use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Inferred aggressor side of a synthesized tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid moved up: buyers lifted the market
    Buy,
    /// Bid moved down: sellers hit the market
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Where a tick originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TickSource {
    /// Live upstream feed
    Live,
    /// Local synthetic price walk
    Simulated,
    /// Historical batch replay
    History,
}

impl fmt::Display for TickSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickSource::Live => write!(f, "live"),
            TickSource::Simulated => write!(f, "simulated"),
            TickSource::History => write!(f, "history"),
        }
    }
}

/// One synthesized tick: a quote combined with inferred volume and side
///
/// Immutable once constructed; the unit of exchange between producers
/// and subscribers. Volume is a heuristic derived from quote movement,
/// not a real execution report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SynthesizedTick {
    /// Instrument identifier
    pub symbol: String,
    /// Mid price, rounded to the instrument's digits
    pub price: f64,
    /// Bid price
    pub bid: f64,
    /// Ask price
    pub ask: f64,
    /// Synthetic traded volume, always >= the instrument's base volume
    pub volume_synthetic: f64,
    /// Inferred aggressor side
    pub side: Side,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Mid price change versus the previous tick
    pub price_change: f64,
    /// Ask minus bid
    pub spread: f64,
    /// Producer that emitted the tick
    pub source: TickSource,
}
