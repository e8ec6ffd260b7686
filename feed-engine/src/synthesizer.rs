//! Volume and trade-side inference from quote movement
//!
//! The upstream feed exposes no trade prints, so traded volume and
//! aggressor side are approximated from bid/ask deltas: a larger mid
//! move synthesizes more volume, a rising bid reads as buying. Jitter
//! and occasional bursts keep the stream statistically plausible for
//! charting consumers without claiming to be real execution data.

use common::model::symbol;
use common::model::tick::{Side, SynthesizedTick, TickSource};
use dashmap::DashMap;
use rand::Rng;

use crate::config::SynthesizerConfig;

/// Per-symbol state, created on the first observation of that symbol
#[derive(Debug, Clone, Copy)]
struct SymbolState {
    last_bid: f64,
    last_mid: f64,
}

/// Result of one synthesis step
#[derive(Debug, Clone, Copy)]
pub struct Synthesis {
    /// Mid price of the observed quote
    pub mid: f64,
    /// Synthetic traded volume
    pub volume: f64,
    /// Mid change versus the previous observation (0 on warm-up)
    pub price_change: f64,
    /// Inferred aggressor side
    pub side: Side,
}

impl Synthesis {
    /// Assemble the wire tick for this synthesis step
    pub fn into_tick(
        self,
        sym: &str,
        bid: f64,
        ask: f64,
        timestamp: i64,
        source: TickSource,
    ) -> SynthesizedTick {
        let profile = symbol::lookup(sym);
        SynthesizedTick {
            symbol: sym.to_string(),
            price: symbol::round_to(self.mid, profile.digits),
            bid: symbol::round_to(bid, profile.digits),
            ask: symbol::round_to(ask, profile.digits),
            volume_synthetic: symbol::round_to(self.volume, 2),
            side: self.side,
            timestamp,
            price_change: symbol::round_to(self.price_change, profile.digits),
            spread: symbol::round_to(ask - bid, profile.digits),
            source,
        }
    }
}

/// Stateful per-symbol quote-to-tick inference
///
/// The live and simulated producers share one instance, so a symbol
/// switch must call [`VolumeSynthesizer::reset`] to keep stale deltas
/// from leaking into the new instrument. Batch replays use a throwaway
/// instance instead.
pub struct VolumeSynthesizer {
    states: DashMap<String, SymbolState>,
    config: SynthesizerConfig,
}

impl VolumeSynthesizer {
    /// Create a synthesizer with the given tunables
    pub fn new(config: SynthesizerConfig) -> Self {
        Self {
            states: DashMap::new(),
            config,
        }
    }

    /// Infer mid price, synthetic volume, price change and side for a quote
    pub fn calc(&self, sym: &str, bid: f64, ask: f64) -> Synthesis {
        let profile = symbol::lookup(sym);
        let mid = (bid + ask) / 2.0;
        let mut rng = rand::thread_rng();

        let previous = self
            .states
            .insert(sym.to_string(), SymbolState { last_bid: bid, last_mid: mid });

        // First observation: seed state, return a neutral tick
        let Some(state) = previous else {
            let volume = profile.base_volume
                * rng.gen_range(self.config.warmup_jitter.0..self.config.warmup_jitter.1);
            let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            return Synthesis { mid, volume, price_change: 0.0, side };
        };

        let price_change = mid - state.last_mid;
        let bid_change = bid - state.last_bid;

        let mut volume = (price_change.abs() * profile.multiplier + profile.base_volume)
            * rng.gen_range(self.config.volume_jitter.0..self.config.volume_jitter.1);
        volume = volume.max(profile.base_volume);

        if rng.gen_bool(self.config.burst_probability) {
            volume *= rng.gen_range(self.config.burst_factor.0..self.config.burst_factor.1);
        }

        let side = if bid_change > 0.0 {
            Side::Buy
        } else if bid_change < 0.0 {
            Side::Sell
        } else if rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };

        Synthesis { mid, volume, price_change, side }
    }

    /// Drop stored state for one symbol, or for all symbols
    ///
    /// The next `calc` for a dropped symbol behaves as a first
    /// observation.
    pub fn reset(&self, sym: Option<&str>) {
        match sym {
            Some(sym) => {
                self.states.remove(sym);
            }
            None => self.states.clear(),
        }
    }
}
