//! Tick synthesis and distribution engine
//!
//! The upstream feed only exposes bid/ask quotes, so traded volume and
//! aggressor side are inferred from quote movement. Two producers feed
//! the stream: a live poll loop against a pluggable [`source::FeedSource`]
//! and an always-warm local simulator. The [`StreamManager`] owns the
//! subscriber registry and decides which producer is active.

mod history;
mod live;
mod manager;
mod simulator;
mod synthesizer;

pub mod config;
pub mod source;

pub use history::HistoryConverter;
pub use live::{AdapterState, LiveFeedAdapter, LiveHandle};
pub use manager::{FeedEvent, StreamManager, StreamStatus, SwitchOutcome};
pub use simulator::SimulatedFeedGenerator;
pub use synthesizer::{Synthesis, VolumeSynthesizer};
