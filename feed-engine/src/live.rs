//! Live feed adapter
//!
//! Drives a poll loop against the upstream [`FeedSource`], deduplicates
//! unchanged quotes by their upstream timestamp, and pushes synthesized
//! ticks into the manager's event channel. Poll errors are transient up
//! to a point: the loop backs off exponentially and gives up after a
//! bounded number of consecutive failures, reporting the end of the
//! live stream instead of retrying forever.

use std::sync::Arc;

use chrono::Utc;
use common::model::tick::TickSource;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{FeedCredentials, LiveFeedConfig};
use crate::manager::FeedEvent;
use crate::source::FeedSource;
use crate::synthesizer::VolumeSynthesizer;

/// Live adapter lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// No session with the upstream source
    Disconnected,
    /// Session being established
    Connecting,
    /// Poll loop running
    Listening,
}

/// Handle to a running listen task
pub struct LiveHandle {
    symbol: String,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LiveHandle {
    /// Instrument the task is bound to
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Request cooperative cancellation and wait for the loop to
    /// acknowledge. No tick is emitted after this returns.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                error!("live listen task for {} failed: {}", self.symbol, e);
            }
        }
    }
}

/// Adapter between the upstream feed source and the tick stream
pub struct LiveFeedAdapter {
    source: Arc<dyn FeedSource>,
    synthesizer: Arc<VolumeSynthesizer>,
    events: mpsc::Sender<FeedEvent>,
    config: LiveFeedConfig,
    state: watch::Sender<AdapterState>,
}

impl LiveFeedAdapter {
    /// Create an adapter emitting into `events`
    pub fn new(
        source: Arc<dyn FeedSource>,
        synthesizer: Arc<VolumeSynthesizer>,
        events: mpsc::Sender<FeedEvent>,
        config: LiveFeedConfig,
    ) -> Self {
        let (state, _) = watch::channel(AdapterState::Disconnected);
        Self { source, synthesizer, events, config, state }
    }

    /// Current lifecycle state
    pub fn state(&self) -> AdapterState {
        *self.state.borrow()
    }

    /// Establish a session with the upstream source
    ///
    /// Delegates to the source; returns false on any failure instead of
    /// erroring.
    pub async fn connect(&self, credentials: Option<&FeedCredentials>) -> bool {
        if !self.source.available() {
            warn!("live feed connector not available");
            return false;
        }
        self.state.send_replace(AdapterState::Connecting);
        let ok = self.source.connect(credentials).await;
        if !ok {
            warn!("live feed connect failed");
            self.state.send_replace(AdapterState::Disconnected);
        }
        ok
    }

    /// Spawn the poll loop for an instrument
    pub fn listen(self: &Arc<Self>, symbol: &str) -> LiveHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let adapter = Arc::clone(self);
        let sym = symbol.to_string();
        let task = tokio::spawn(async move {
            adapter.run(sym, cancel_rx).await;
        });
        LiveHandle {
            symbol: symbol.to_string(),
            cancel: cancel_tx,
            task,
        }
    }

    async fn run(&self, symbol: String, mut cancel: watch::Receiver<bool>) {
        self.state.send_replace(AdapterState::Listening);
        info!("live poll loop started for {}", symbol);

        let mut last_time: Option<i64> = None;
        let mut consecutive_errors: u32 = 0;
        let mut emitted: u64 = 0;

        loop {
            let pause = match self.source.poll_latest(&symbol).await {
                Ok(quote) => {
                    consecutive_errors = 0;
                    if let Some(q) = quote {
                        let ts = q.timestamp_ms();
                        // Emit only when the upstream timestamp advanced;
                        // non-positive quotes are discarded silently
                        if last_time != Some(ts) {
                            last_time = Some(ts);
                            if q.bid > 0.0 && q.ask > 0.0 {
                                let synthesis = self.synthesizer.calc(&symbol, q.bid, q.ask);
                                let tick = synthesis.into_tick(
                                    &symbol,
                                    q.bid,
                                    q.ask,
                                    Utc::now().timestamp_millis(),
                                    TickSource::Live,
                                );
                                emitted += 1;
                                if emitted % 100 == 0 {
                                    info!("live tick #{}: {} {}/{}", emitted, symbol, q.bid, q.ask);
                                }
                                // Manager gone means nothing left to feed
                                if self.events.send(FeedEvent::Tick(tick)).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors > self.config.max_consecutive_errors {
                        error!(
                            "live feed for {} gave up after {} consecutive poll errors: {}",
                            symbol, self.config.max_consecutive_errors, e
                        );
                        let _ = self
                            .events
                            .send(FeedEvent::LiveEnded {
                                symbol: symbol.clone(),
                                reason: e.to_string(),
                            })
                            .await;
                        break;
                    }
                    warn!(
                        "poll error for {} ({} consecutive): {}",
                        symbol, consecutive_errors, e
                    );
                    backoff_for(consecutive_errors, &self.config)
                }
            };

            tokio::select! {
                _ = sleep(pause) => {}
                changed = cancel.changed() => {
                    // A dropped handle counts as cancellation
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
            }
        }

        self.state.send_replace(AdapterState::Disconnected);
        info!("live poll loop stopped for {}", symbol);
    }
}

/// Exponential backoff, capped
fn backoff_for(attempt: u32, config: &LiveFeedConfig) -> std::time::Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(16));
    config
        .retry_backoff
        .saturating_mul(factor)
        .min(config.retry_backoff_cap)
}
