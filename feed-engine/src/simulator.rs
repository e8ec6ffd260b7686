//! Simulated feed generator
//!
//! Produces a smooth synthetic price walk when no live feed is active.
//! The generator runs continuously regardless of the current mode so a
//! fallback to simulation has zero startup latency; while the stream is
//! live it merely idles and rechecks.

use std::collections::HashMap;

use chrono::Utc;
use common::model::stream::StreamMode;
use common::model::symbol;
use common::model::tick::TickSource;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::info;

use crate::config::SimulatorConfig;
use crate::manager::FeedEvent;
use crate::synthesizer::VolumeSynthesizer;

/// Always-warm synthetic price walk producer
pub struct SimulatedFeedGenerator {
    synthesizer: Arc<VolumeSynthesizer>,
    events: mpsc::Sender<FeedEvent>,
    mode: watch::Receiver<StreamMode>,
    symbol: watch::Receiver<String>,
    config: SimulatorConfig,
}

impl SimulatedFeedGenerator {
    /// Create a generator reading mode and active symbol from watches
    pub fn new(
        synthesizer: Arc<VolumeSynthesizer>,
        events: mpsc::Sender<FeedEvent>,
        mode: watch::Receiver<StreamMode>,
        symbol: watch::Receiver<String>,
        config: SimulatorConfig,
    ) -> Self {
        Self { synthesizer, events, mode, symbol, config }
    }

    /// Spawn the generator loop; it runs until cancelled
    pub fn spawn(self) -> (watch::Sender<bool>, JoinHandle<()>) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(cancel_rx));
        (cancel_tx, task)
    }

    async fn run(self, mut cancel: watch::Receiver<bool>) {
        info!("simulated feed generator started");
        let mut prices: HashMap<String, f64> = HashMap::new();
        let mut n: u64 = 0;

        loop {
            let pause = if *self.mode.borrow() == StreamMode::Simulated {
                n += 1;
                let sym = self.symbol.borrow().clone();
                let profile = symbol::lookup(&sym);
                let price = prices.entry(sym.clone()).or_insert(profile.base_price);

                // Sinusoidal drift plus small random jitter, both scaled
                // to a fraction of the current price
                let nf = *price * self.config.drift_fraction;
                let cycle_pause;
                {
                    let mut rng = rand::thread_rng();
                    *price += (n as f64 / self.config.drift_period).sin()
                        * nf
                        * self.config.drift_weight
                        + (rng.gen::<f64>() - 0.5) * nf;
                    cycle_pause = self
                        .config
                        .cycle_min
                        .saturating_add(
                            (self.config.cycle_max - self.config.cycle_min)
                                .mul_f64(rng.gen::<f64>()),
                        );
                }

                let spread = *price * self.config.spread_fraction;
                let (bid, ask) = (*price - spread / 2.0, *price + spread / 2.0);

                let synthesis = self.synthesizer.calc(&sym, bid, ask);
                let tick = synthesis.into_tick(
                    &sym,
                    bid,
                    ask,
                    Utc::now().timestamp_millis(),
                    TickSource::Simulated,
                );
                if self.events.send(FeedEvent::Tick(tick)).await.is_err() {
                    break;
                }
                cycle_pause
            } else {
                self.config.idle
            };

            tokio::select! {
                _ = sleep(pause) => {}
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
            }
        }
        info!("simulated feed generator stopped");
    }
}
