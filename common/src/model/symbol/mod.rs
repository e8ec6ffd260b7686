//! Instrument scaling profiles
//!
//! The synthesizer scales quote deltas into plausible volume figures
//! using per-instrument constants. Profiles are static, created once,
//! and lookup is total: unknown instruments fall back to a documented
//! default instead of failing.

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Scaling constants for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SymbolProfile {
    /// Factor converting an absolute price move into a volume figure
    pub multiplier: f64,
    /// Floor for synthetic volume
    pub base_volume: f64,
    /// Decimal digits used when rounding prices for display
    pub digits: u32,
    /// Starting price for the simulated walk
    pub base_price: f64,
}

/// Profile applied to instruments missing from the table
pub const DEFAULT_PROFILE: SymbolProfile = SymbolProfile {
    multiplier: 1000.0,
    base_volume: 5.0,
    digits: 5,
    base_price: 1.0,
};

const PROFILES: &[(&str, SymbolProfile)] = &[
    ("EURUSD", SymbolProfile { multiplier: 100_000.0, base_volume: 5.0, digits: 5, base_price: 1.0850 }),
    ("GBPUSD", SymbolProfile { multiplier: 100_000.0, base_volume: 5.0, digits: 5, base_price: 1.2650 }),
    ("USDJPY", SymbolProfile { multiplier: 1000.0, base_volume: 5.0, digits: 3, base_price: 149.50 }),
    ("XAUUSD", SymbolProfile { multiplier: 50.0, base_volume: 10.0, digits: 2, base_price: 2350.0 }),
    ("USTEC", SymbolProfile { multiplier: 2.0, base_volume: 10.0, digits: 2, base_price: 18_500.0 }),
    ("US100", SymbolProfile { multiplier: 2.0, base_volume: 10.0, digits: 2, base_price: 18_500.0 }),
    ("NAS100", SymbolProfile { multiplier: 2.0, base_volume: 10.0, digits: 2, base_price: 18_500.0 }),
    ("BTCUSD", SymbolProfile { multiplier: 1.0, base_volume: 5.0, digits: 2, base_price: 67_000.0 }),
];

/// Look up the profile for an instrument
///
/// Case-insensitive and total: never fails, unknown symbols resolve to
/// [`DEFAULT_PROFILE`].
pub fn lookup(symbol: &str) -> SymbolProfile {
    let upper = symbol.to_uppercase();
    PROFILES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, profile)| *profile)
        .unwrap_or(DEFAULT_PROFILE)
}

/// Instruments with a registered profile
pub fn known_symbols() -> Vec<&'static str> {
    PROFILES.iter().map(|(name, _)| *name).collect()
}

/// Round a value to a fixed number of decimal digits
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}
