//! Engine configuration
//!
//! Jitter bands, burst odds, and pacing intervals are plain
//! configuration rather than fixed law, so deployments (and tests) can
//! pin or adjust them. The defaults are the tuning the service ships
//! with.

use std::env;
use std::time::Duration;

/// Credentials for the upstream live feed
///
/// Supplied exclusively through the environment; there is no default
/// credential anywhere in the tree.
#[derive(Debug, Clone)]
pub struct FeedCredentials {
    /// Account number
    pub login: i64,
    /// Account password
    pub password: String,
    /// Broker server name
    pub server: String,
    /// Connect timeout
    pub timeout: Duration,
}

impl FeedCredentials {
    /// Read credentials from `FEED_LOGIN` / `FEED_PASSWORD` /
    /// `FEED_SERVER` / `FEED_TIMEOUT_MS`; `None` when not configured
    pub fn from_env() -> Option<Self> {
        let login = env::var("FEED_LOGIN").ok()?.parse().ok()?;
        let password = env::var("FEED_PASSWORD").ok()?;
        let server = env::var("FEED_SERVER").ok()?;
        let timeout = env::var("FEED_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(60));
        Some(Self { login, password, server, timeout })
    }
}

/// Tunables for volume and side inference
#[derive(Debug, Clone, Copy)]
pub struct SynthesizerConfig {
    /// Volume jitter band applied to the first observation of a symbol
    pub warmup_jitter: (f64, f64),
    /// Volume jitter band applied to every later observation
    pub volume_jitter: (f64, f64),
    /// Probability of a volume burst per tick
    pub burst_probability: f64,
    /// Burst multiplier band
    pub burst_factor: (f64, f64),
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            warmup_jitter: (0.8, 1.2),
            volume_jitter: (0.7, 1.3),
            burst_probability: 0.03,
            burst_factor: (3.0, 8.0),
        }
    }
}

/// Tunables for the simulated price walk
#[derive(Debug, Clone, Copy)]
pub struct SimulatorConfig {
    /// Walk step size as a fraction of the current price
    pub drift_fraction: f64,
    /// Weight of the sinusoidal component within a step
    pub drift_weight: f64,
    /// Period of the sinusoidal component, in cycles
    pub drift_period: f64,
    /// Synthetic spread as a fraction of the current price
    pub spread_fraction: f64,
    /// Lower bound of the randomized cycle pause
    pub cycle_min: Duration,
    /// Upper bound of the randomized cycle pause
    pub cycle_max: Duration,
    /// Recheck pause while another producer is active
    pub idle: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            drift_fraction: 0.00005,
            drift_weight: 0.3,
            drift_period: 300.0,
            spread_fraction: 0.00008,
            cycle_min: Duration::from_millis(50),
            cycle_max: Duration::from_millis(200),
            idle: Duration::from_secs(1),
        }
    }
}

/// Tunables for the live poll loop
#[derive(Debug, Clone, Copy)]
pub struct LiveFeedConfig {
    /// Pause between polls of the upstream source
    pub poll_interval: Duration,
    /// Initial backoff after a poll error
    pub retry_backoff: Duration,
    /// Ceiling for the exponential backoff
    pub retry_backoff_cap: Duration,
    /// Consecutive poll errors tolerated before the adapter gives up
    pub max_consecutive_errors: u32,
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            retry_backoff: Duration::from_secs(1),
            retry_backoff_cap: Duration::from_secs(30),
            max_consecutive_errors: 10,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Synthesizer tunables
    pub synthesizer: SynthesizerConfig,
    /// Simulator tunables
    pub simulator: SimulatorConfig,
    /// Live poll loop tunables
    pub live: LiveFeedConfig,
    /// Capacity of the producer-to-manager event channel
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            synthesizer: SynthesizerConfig::default(),
            simulator: SimulatorConfig::default(),
            live: LiveFeedConfig::default(),
            event_buffer: 256,
        }
    }
}
