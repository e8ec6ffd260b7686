//! Batch conversion of historical quotes into synthesized ticks

use std::sync::Arc;

use chrono::Utc;
use common::model::tick::{SynthesizedTick, TickSource};
use common::{Error, Result};
use tracing::{debug, info};

use crate::config::SynthesizerConfig;
use crate::source::FeedSource;
use crate::synthesizer::VolumeSynthesizer;

/// Record cap for the fallback retrieval when the windowed query is empty
pub const HISTORY_FALLBACK_LIMIT: usize = 500_000;

/// Converts raw quote history into a synthesized tick sequence
pub struct HistoryConverter {
    source: Arc<dyn FeedSource>,
    config: SynthesizerConfig,
}

impl HistoryConverter {
    /// Create a converter reading from the given source
    pub fn new(source: Arc<dyn FeedSource>, config: SynthesizerConfig) -> Self {
        Self { source, config }
    }

    /// Replay a window of raw quotes through a throwaway synthesizer
    ///
    /// Replay happens in arrival order: each tick's volume and side
    /// depend on the previous quote, so reordering would change the
    /// output. Records with non-positive or non-finite bid/ask are
    /// skipped without aborting the batch; an empty result is not an
    /// error.
    pub async fn convert(&self, sym: &str, hours: f64) -> Result<Vec<SynthesizedTick>> {
        if !self.source.connected() {
            return Err(Error::FeedUnavailable);
        }
        let sym = sym.to_uppercase();
        if !self.source.select(&sym).await {
            return Err(Error::SymbolUnsupported(sym));
        }

        let to = Utc::now();
        let from = to - chrono::Duration::milliseconds((hours * 3_600_000.0) as i64);

        let mut raw = self.source.fetch_history(&sym, from, to).await?;
        if raw.is_empty() {
            raw = self
                .source
                .fetch_history_from(&sym, from, HISTORY_FALLBACK_LIMIT)
                .await?;
        }
        if raw.is_empty() {
            debug!("no history for {} in the last {}h", sym, hours);
            return Ok(Vec::new());
        }
        info!("{}: {} raw quotes for a {}h window", sym, raw.len(), hours);

        // Throwaway instance so replay never pollutes live stream state
        let synthesizer = VolumeSynthesizer::new(self.config);
        let mut ticks = Vec::with_capacity(raw.len());
        for quote in raw {
            if !quote.is_valid() {
                continue;
            }
            let synthesis = synthesizer.calc(&sym, quote.bid, quote.ask);
            ticks.push(synthesis.into_tick(
                &sym,
                quote.bid,
                quote.ask,
                quote.timestamp_ms(),
                TickSource::History,
            ));
        }
        info!("{}: converted {} ticks", sym, ticks.len());
        Ok(ticks)
    }
}
