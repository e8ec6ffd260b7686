//! Feed source port and in-memory implementations
//!
//! [`FeedSource`] is the contract an upstream live-quote connector has
//! to satisfy. The bridge itself ships two implementations: a null
//! source for deployments without a connector, and a scripted
//! in-memory source used by tests and the demo mode.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::model::quote::Quote;
use common::{Error, Result};

use crate::config::FeedCredentials;

/// Contract for an upstream live-quote source
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Whether the connector binding is present at all
    fn available(&self) -> bool;

    /// Whether a session is currently established
    fn connected(&self) -> bool;

    /// Establish a session; false on failure, never errors
    ///
    /// `None` credentials attempt to attach to an already authenticated
    /// upstream session.
    async fn connect(&self, credentials: Option<&FeedCredentials>) -> bool;

    /// Enable an instrument for streaming; false when unsupported
    async fn select(&self, symbol: &str) -> bool;

    /// Latest quote for an instrument, `None` when nothing is known yet
    async fn poll_latest(&self, symbol: &str) -> Result<Option<Quote>>;

    /// Quote history inside `[from, to]`, in arrival order
    async fn fetch_history(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Quote>>;

    /// Fallback retrieval: up to `max_count` quotes starting at `from`
    async fn fetch_history_from(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<Quote>>;

    /// Instruments the source knows about
    async fn symbols(&self) -> Vec<String>;

    /// Tear down the session
    async fn disconnect(&self);
}

/// Stand-in used when no upstream connector is configured
///
/// Reports the connector as absent, so the stream stays simulated.
#[derive(Debug, Default)]
pub struct NullFeedSource;

#[async_trait]
impl FeedSource for NullFeedSource {
    fn available(&self) -> bool {
        false
    }

    fn connected(&self) -> bool {
        false
    }

    async fn connect(&self, _credentials: Option<&FeedCredentials>) -> bool {
        false
    }

    async fn select(&self, _symbol: &str) -> bool {
        false
    }

    async fn poll_latest(&self, _symbol: &str) -> Result<Option<Quote>> {
        Ok(None)
    }

    async fn fetch_history(
        &self,
        _symbol: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        Ok(Vec::new())
    }

    async fn fetch_history_from(
        &self,
        _symbol: &str,
        _from: DateTime<Utc>,
        _max_count: usize,
    ) -> Result<Vec<Quote>> {
        Ok(Vec::new())
    }

    async fn symbols(&self) -> Vec<String> {
        Vec::new()
    }

    async fn disconnect(&self) {}
}

#[derive(Debug, Default)]
struct MemoryFeed {
    symbols: Vec<String>,
    latest: HashMap<String, VecDeque<Quote>>,
    history: HashMap<String, Vec<Quote>>,
}

/// Scripted in-memory feed source
///
/// Quotes pushed via [`MemoryFeedSource::push_quote`] are served one
/// per poll; history batches are served by time window. Connection
/// rejection and transient poll failures can be injected.
pub struct MemoryFeedSource {
    connected: AtomicBool,
    accept_connections: AtomicBool,
    poll_failures: AtomicU32,
    inner: Mutex<MemoryFeed>,
}

impl MemoryFeedSource {
    /// Create a source that knows the given instruments
    pub fn new(symbols: &[&str]) -> Self {
        Self {
            connected: AtomicBool::new(false),
            accept_connections: AtomicBool::new(true),
            poll_failures: AtomicU32::new(0),
            inner: Mutex::new(MemoryFeed {
                symbols: symbols.iter().map(|s| s.to_uppercase()).collect(),
                ..MemoryFeed::default()
            }),
        }
    }

    /// Queue a quote to be returned by the next poll for `symbol`
    pub fn push_quote(&self, symbol: &str, quote: Quote) {
        let mut inner = self.lock();
        inner
            .latest
            .entry(symbol.to_uppercase())
            .or_default()
            .push_back(quote);
    }

    /// Replace the scripted history batch for `symbol`
    pub fn set_history(&self, symbol: &str, quotes: Vec<Quote>) {
        self.lock().history.insert(symbol.to_uppercase(), quotes);
    }

    /// Make every subsequent connect attempt fail
    pub fn reject_connections(&self) {
        self.accept_connections.store(false, Ordering::SeqCst);
    }

    /// Fail the next `count` polls with a transport error
    pub fn fail_next_polls(&self, count: u32) {
        self.poll_failures.store(count, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryFeed> {
        // Held only for map access, never across an await
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FeedSource for MemoryFeedSource {
    fn available(&self) -> bool {
        true
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self, _credentials: Option<&FeedCredentials>) -> bool {
        if !self.accept_connections.load(Ordering::SeqCst) {
            return false;
        }
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    async fn select(&self, symbol: &str) -> bool {
        let upper = symbol.to_uppercase();
        self.lock().symbols.iter().any(|s| *s == upper)
    }

    async fn poll_latest(&self, symbol: &str) -> Result<Option<Quote>> {
        if self.poll_failures.load(Ordering::SeqCst) > 0 {
            self.poll_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Transport("injected poll failure".to_string()));
        }
        let mut inner = self.lock();
        Ok(inner
            .latest
            .get_mut(&symbol.to_uppercase())
            .and_then(|queue| queue.pop_front()))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        let inner = self.lock();
        Ok(inner
            .history
            .get(&symbol.to_uppercase())
            .map(|quotes| {
                quotes
                    .iter()
                    .filter(|q| q.time >= from && q.time <= to)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_history_from(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        max_count: usize,
    ) -> Result<Vec<Quote>> {
        let inner = self.lock();
        Ok(inner
            .history
            .get(&symbol.to_uppercase())
            .map(|quotes| {
                quotes
                    .iter()
                    .filter(|q| q.time >= from)
                    .take(max_count)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn symbols(&self) -> Vec<String> {
        self.lock().symbols.clone()
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
