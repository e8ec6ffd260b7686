//! Stream manager
//!
//! Owns the subscriber registry, the current mode and active symbol,
//! and the producer tasks. Producers push [`FeedEvent`]s into a bounded
//! channel; the manager's fan-out task consumes it and delivers to
//! every subscriber, so producer pacing is decoupled from subscriber
//! I/O latency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use common::model::stream::StreamMode;
use common::model::tick::SynthesizedTick;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, FeedCredentials};
use crate::live::{LiveFeedAdapter, LiveHandle};
use crate::simulator::SimulatedFeedGenerator;
use crate::source::FeedSource;
use crate::synthesizer::VolumeSynthesizer;

/// Events flowing from producers to the manager
#[derive(Debug)]
pub enum FeedEvent {
    /// A synthesized tick ready for fan-out
    Tick(SynthesizedTick),
    /// The live poll loop gave up (bounded retry exhausted)
    LiveEnded {
        /// Instrument the loop was bound to
        symbol: String,
        /// Last error observed
        reason: String,
    },
}

/// Result of a symbol switch request
#[derive(Debug, Clone, Serialize)]
pub struct SwitchOutcome {
    /// Whether the live restart succeeded (always true in simulated mode)
    pub success: bool,
    /// Mode after the switch; defined even when the live restart failed
    pub mode: StreamMode,
    /// The new active symbol
    pub symbol: String,
}

/// Point-in-time service status
#[derive(Debug, Clone, Serialize)]
pub struct StreamStatus {
    /// Current stream mode
    pub mode: StreamMode,
    /// Active instrument
    pub symbol: String,
    /// Connected subscribers
    pub clients: usize,
    /// Whether a live connector binding exists
    pub feed_available: bool,
    /// Whether a live session is established
    pub feed_connected: bool,
    /// Ticks fanned out since startup
    pub tick_count: u64,
}

/// Owner of the subscriber registry and both producers
pub struct StreamManager {
    subscribers: DashMap<Uuid, mpsc::Sender<String>>,
    mode: watch::Sender<StreamMode>,
    symbol: watch::Sender<String>,
    synthesizer: Arc<VolumeSynthesizer>,
    source: Arc<dyn FeedSource>,
    credentials: Option<FeedCredentials>,
    config: EngineConfig,
    events: mpsc::Sender<FeedEvent>,
    live: Mutex<Option<LiveHandle>>,
    tasks: Mutex<Vec<(watch::Sender<bool>, JoinHandle<()>)>>,
    tick_count: AtomicU64,
}

impl StreamManager {
    /// Create the manager and start the simulator and fan-out tasks
    ///
    /// The stream begins in simulated mode; call
    /// [`StreamManager::start_live`] to attempt the live feed.
    pub async fn start(
        source: Arc<dyn FeedSource>,
        credentials: Option<FeedCredentials>,
        default_symbol: &str,
        config: EngineConfig,
    ) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer);
        let (mode_tx, _) = watch::channel(StreamMode::Simulated);
        let (symbol_tx, _) = watch::channel(default_symbol.to_uppercase());
        let synthesizer = Arc::new(VolumeSynthesizer::new(config.synthesizer));

        let manager = Arc::new(Self {
            subscribers: DashMap::new(),
            mode: mode_tx,
            symbol: symbol_tx,
            synthesizer,
            source,
            credentials,
            config,
            events: events_tx,
            live: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            tick_count: AtomicU64::new(0),
        });

        // Fan-out consumer
        let (fan_cancel, fan_cancel_rx) = watch::channel(false);
        let fan_task = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager.consume(events_rx, fan_cancel_rx).await;
            })
        };

        // Always-warm simulator
        let generator = SimulatedFeedGenerator::new(
            Arc::clone(&manager.synthesizer),
            manager.events.clone(),
            manager.mode.subscribe(),
            manager.symbol.subscribe(),
            manager.config.simulator,
        );
        let (sim_cancel, sim_task) = generator.spawn();

        {
            let mut tasks = manager.tasks.lock().await;
            tasks.push((fan_cancel, fan_task));
            tasks.push((sim_cancel, sim_task));
        }

        manager
    }

    /// Current stream mode
    pub fn mode(&self) -> StreamMode {
        *self.mode.borrow()
    }

    /// Currently streamed instrument
    pub fn active_symbol(&self) -> String {
        self.symbol.borrow().clone()
    }

    /// The upstream feed source
    pub fn feed(&self) -> Arc<dyn FeedSource> {
        Arc::clone(&self.source)
    }

    /// Point-in-time status snapshot
    pub fn status(&self) -> StreamStatus {
        StreamStatus {
            mode: self.mode(),
            symbol: self.active_symbol(),
            clients: self.subscribers.len(),
            feed_available: self.source.available(),
            feed_connected: self.source.connected(),
            tick_count: self.tick_count.load(Ordering::Relaxed),
        }
    }

    /// Register a subscriber; returns its handle id
    pub fn subscribe(&self, sender: mpsc::Sender<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, sender);
        info!("subscriber {} connected ({} total)", id, self.subscribers.len());
        id
    }

    /// Remove a subscriber; idempotent
    pub fn unsubscribe(&self, id: &Uuid) {
        if self.subscribers.remove(id).is_some() {
            info!("subscriber {} disconnected ({} total)", id, self.subscribers.len());
        }
    }

    /// Deliver a tick to every subscriber
    ///
    /// A subscriber whose channel is closed or full is removed from the
    /// registry; delivery to one never blocks or fails the others.
    pub fn broadcast(&self, tick: &SynthesizedTick) {
        let message = json!({ "type": "tick", "data": tick }).to_string();

        let mut dead = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.value().try_send(message.clone()).is_err() {
                dead.push(*entry.key());
            }
        }
        for id in dead {
            self.subscribers.remove(&id);
            warn!("dropping unresponsive subscriber {}", id);
        }
    }

    /// Attempt to switch the stream to the live feed
    ///
    /// On success the mode becomes `Live`; on any failure the stream
    /// stays simulated and `false` is returned. Subscribers are never
    /// left without a tick stream.
    pub async fn start_live(&self, sym: &str) -> bool {
        let sym = sym.to_uppercase();
        self.symbol.send_replace(sym.clone());

        let adapter = Arc::new(LiveFeedAdapter::new(
            Arc::clone(&self.source),
            Arc::clone(&self.synthesizer),
            self.events.clone(),
            self.config.live,
        ));

        if !adapter.connect(self.credentials.as_ref()).await {
            warn!("live feed unavailable; staying in simulated mode");
            self.set_mode(StreamMode::Simulated);
            return false;
        }
        if !self.source.select(&sym).await {
            warn!("{} not available on the live feed; staying in simulated mode", sym);
            self.source.disconnect().await;
            self.set_mode(StreamMode::Simulated);
            return false;
        }

        let handle = adapter.listen(&sym);
        *self.live.lock().await = Some(handle);
        self.set_mode(StreamMode::Live);
        info!("live feed started for {}", sym);
        true
    }

    /// Stop the live adapter and fall back to the simulator
    pub async fn stop_live(&self) {
        if let Some(handle) = self.live.lock().await.take() {
            handle.stop().await;
            self.source.disconnect().await;
        }
        self.set_mode(StreamMode::Simulated);
    }

    /// Change the active instrument
    ///
    /// Resets synthesizer state for the new symbol so stale deltas never
    /// leak into it. In live mode the adapter is restarted against the
    /// new symbol, degrading to simulated if that fails; in simulated
    /// mode the generator adopts the symbol on its next cycle.
    pub async fn switch_symbol(&self, sym: &str) -> SwitchOutcome {
        let sym = sym.to_uppercase();
        info!("switching active symbol to {}", sym);
        self.synthesizer.reset(Some(&sym));
        self.symbol.send_replace(sym.clone());

        if self.mode() == StreamMode::Live {
            self.stop_live().await;
            let success = self.start_live(&sym).await;
            return SwitchOutcome { success, mode: self.mode(), symbol: sym };
        }

        SwitchOutcome { success: true, mode: self.mode(), symbol: sym }
    }

    /// Stop every producer task; the manager cannot be restarted
    pub async fn shutdown(&self) {
        self.stop_live().await;
        let tasks = {
            let mut tasks = self.tasks.lock().await;
            std::mem::take(&mut *tasks)
        };
        for (cancel, task) in tasks {
            let _ = cancel.send(true);
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("producer task failed during shutdown: {}", e);
                }
            }
        }
        info!("stream manager shut down");
    }

    fn set_mode(&self, mode: StreamMode) {
        if *self.mode.borrow() != mode {
            info!("stream mode -> {}", mode);
        }
        self.mode.send_replace(mode);
    }

    async fn consume(
        &self,
        mut events: mpsc::Receiver<FeedEvent>,
        mut cancel: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(FeedEvent::Tick(tick)) => {
                        self.tick_count.fetch_add(1, Ordering::Relaxed);
                        self.broadcast(&tick);
                    }
                    Some(FeedEvent::LiveEnded { symbol, reason }) => {
                        warn!("live feed for {} ended: {}", symbol, reason);
                        // Ignore stale reports from an adapter that was
                        // already replaced by a newer one
                        let is_current = self
                            .live
                            .lock()
                            .await
                            .as_ref()
                            .map(|handle| handle.symbol() == symbol)
                            .unwrap_or(false);
                        if is_current {
                            self.stop_live().await;
                        } else {
                            debug!("stale live-end report for {}", symbol);
                        }
                    }
                    None => break,
                }
            }
        }
    }
}
