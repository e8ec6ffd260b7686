use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::model::quote::Quote;
use common::model::stream::StreamMode;
use feed_engine::config::{EngineConfig, LiveFeedConfig, SimulatorConfig};
use feed_engine::source::{FeedSource, MemoryFeedSource, NullFeedSource};
use feed_engine::StreamManager;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

fn fast_config() -> EngineConfig {
    EngineConfig {
        simulator: SimulatorConfig {
            cycle_min: Duration::from_millis(1),
            cycle_max: Duration::from_millis(2),
            idle: Duration::from_millis(5),
            ..SimulatorConfig::default()
        },
        live: LiveFeedConfig {
            poll_interval: Duration::from_millis(1),
            retry_backoff: Duration::from_millis(1),
            retry_backoff_cap: Duration::from_millis(2),
            max_consecutive_errors: 2,
        },
        ..EngineConfig::default()
    }
}

async fn next_json(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
    let text = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream closed");
    serde_json::from_str(&text).expect("invalid frame")
}

#[tokio::test]
async fn test_simulator_ticks_reach_subscribers() {
    let manager = StreamManager::start(
        Arc::new(NullFeedSource),
        None,
        "eurusd",
        fast_config(),
    )
    .await;

    let (tx, mut rx) = mpsc::channel(256);
    manager.subscribe(tx);

    let frame = next_json(&mut rx).await;
    assert_eq!(frame["type"], "tick");
    assert_eq!(frame["data"]["symbol"], "EURUSD");
    assert_eq!(frame["data"]["source"], "simulated");
    assert!(frame["data"]["volume_synthetic"].as_f64().unwrap() > 0.0);

    assert!(manager.status().tick_count > 0);
    manager.shutdown().await;
}

#[tokio::test]
async fn test_start_live_with_null_source_stays_simulated() {
    let manager = StreamManager::start(
        Arc::new(NullFeedSource),
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    assert!(!manager.start_live("EURUSD").await);
    assert_eq!(manager.mode(), StreamMode::Simulated);
    manager.shutdown().await;
}

#[tokio::test]
async fn test_failed_live_connect_keeps_the_stream_alive() {
    let source = Arc::new(MemoryFeedSource::new(&["EURUSD"]));
    source.reject_connections();
    let manager = StreamManager::start(
        Arc::clone(&source) as Arc<dyn FeedSource>,
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    assert!(!manager.start_live("EURUSD").await);
    assert_eq!(manager.mode(), StreamMode::Simulated);
    assert!(!manager.status().feed_connected);

    // Subscribers still get simulated ticks after the failure
    let (tx, mut rx) = mpsc::channel(256);
    manager.subscribe(tx);
    let frame = next_json(&mut rx).await;
    assert_eq!(frame["data"]["source"], "simulated");

    manager.shutdown().await;
}

#[tokio::test]
async fn test_start_live_rejects_unsupported_symbol() {
    let source = Arc::new(MemoryFeedSource::new(&["EURUSD"]));
    let manager = StreamManager::start(
        Arc::clone(&source) as Arc<dyn FeedSource>,
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    assert!(!manager.start_live("DOGEUSD").await);
    assert_eq!(manager.mode(), StreamMode::Simulated);
    // Session was torn down, not left half-open
    assert!(!source.connected());

    manager.shutdown().await;
}

#[tokio::test]
async fn test_start_live_streams_live_ticks() {
    let source = Arc::new(MemoryFeedSource::new(&["EURUSD"]));
    for i in 0..50 {
        source.push_quote(
            "EURUSD",
            Quote::new(
                1.0850 + i as f64 * 0.0001,
                1.0851 + i as f64 * 0.0001,
                Utc::now() + chrono::Duration::milliseconds(i),
            ),
        );
    }
    let manager = StreamManager::start(
        Arc::clone(&source) as Arc<dyn FeedSource>,
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    assert!(manager.start_live("eurusd").await);
    assert_eq!(manager.mode(), StreamMode::Live);
    assert_eq!(manager.active_symbol(), "EURUSD");

    let (tx, mut rx) = mpsc::channel(256);
    manager.subscribe(tx);

    // Drain until a live tick shows up; a simulated tick emitted just
    // before the mode flip may still be in flight
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        assert!(tokio::time::Instant::now() < deadline, "no live tick seen");
        let frame = next_json(&mut rx).await;
        if frame["data"]["source"] == "live" {
            assert_eq!(frame["data"]["symbol"], "EURUSD");
            break;
        }
    }

    manager.shutdown().await;
}

#[tokio::test]
async fn test_exhausted_live_feed_degrades_to_simulated() {
    let source = Arc::new(MemoryFeedSource::new(&["EURUSD"]));
    let manager = StreamManager::start(
        Arc::clone(&source) as Arc<dyn FeedSource>,
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    assert!(manager.start_live("EURUSD").await);
    assert_eq!(manager.mode(), StreamMode::Live);

    // The poll loop gives up after the bounded retry and the manager
    // falls back to the simulator on its own
    source.fail_next_polls(50);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while manager.mode() != StreamMode::Simulated {
        assert!(
            tokio::time::Instant::now() < deadline,
            "manager never degraded to simulated"
        );
        sleep(Duration::from_millis(5)).await;
    }
    assert!(!manager.status().feed_connected);

    manager.shutdown().await;
}

#[tokio::test]
async fn test_switch_symbol_in_simulated_mode() {
    let manager = StreamManager::start(
        Arc::new(NullFeedSource),
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    let outcome = manager.switch_symbol("xauusd").await;
    assert!(outcome.success);
    assert_eq!(outcome.mode, StreamMode::Simulated);
    assert_eq!(outcome.symbol, "XAUUSD");
    assert_eq!(manager.active_symbol(), "XAUUSD");

    // The generator picks up the new symbol on a later cycle
    let (tx, mut rx) = mpsc::channel(256);
    manager.subscribe(tx);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        assert!(tokio::time::Instant::now() < deadline, "no XAUUSD tick seen");
        let frame = next_json(&mut rx).await;
        if frame["data"]["symbol"] == "XAUUSD" {
            break;
        }
    }

    manager.shutdown().await;
}

#[tokio::test]
async fn test_switch_symbol_degrades_when_live_restart_fails() {
    let source = Arc::new(MemoryFeedSource::new(&["EURUSD", "GBPUSD"]));
    let manager = StreamManager::start(
        Arc::clone(&source) as Arc<dyn FeedSource>,
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    assert!(manager.start_live("EURUSD").await);
    assert_eq!(manager.mode(), StreamMode::Live);

    // Session drops between the teardown and the reconnect attempt
    source.reject_connections();

    let outcome = manager.switch_symbol("gbpusd").await;
    assert!(!outcome.success);
    assert_eq!(outcome.mode, StreamMode::Simulated);
    assert_eq!(outcome.symbol, "GBPUSD");
    assert_eq!(manager.mode(), StreamMode::Simulated);
    assert_eq!(manager.active_symbol(), "GBPUSD");

    // The failed restart still leaves subscribers with a tick stream
    let (tx, mut rx) = mpsc::channel(256);
    manager.subscribe(tx);
    let frame = next_json(&mut rx).await;
    assert_eq!(frame["data"]["source"], "simulated");

    manager.shutdown().await;
}

#[tokio::test]
async fn test_broadcast_survives_dead_subscribers() {
    let manager = StreamManager::start(
        Arc::new(NullFeedSource),
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    let (tx_a, mut rx_a) = mpsc::channel(4096);
    let (tx_b, rx_b) = mpsc::channel(4096);
    let (tx_c, mut rx_c) = mpsc::channel(4096);
    manager.subscribe(tx_a);
    manager.subscribe(tx_b);
    manager.subscribe(tx_c);
    assert_eq!(manager.status().clients, 3);

    // One subscriber walks away without unsubscribing
    drop(rx_b);

    // The registry heals on the next delivery attempts
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while manager.status().clients != 2 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "dead subscriber was never removed"
        );
        sleep(Duration::from_millis(5)).await;
    }

    // Survivors keep receiving
    let frame = next_json(&mut rx_a).await;
    assert_eq!(frame["type"], "tick");
    let frame = next_json(&mut rx_c).await;
    assert_eq!(frame["type"], "tick");

    manager.shutdown().await;
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let manager = StreamManager::start(
        Arc::new(NullFeedSource),
        None,
        "EURUSD",
        fast_config(),
    )
    .await;

    let (tx, _rx) = mpsc::channel(256);
    let id = manager.subscribe(tx);
    assert_eq!(manager.status().clients, 1);

    manager.unsubscribe(&id);
    manager.unsubscribe(&id);
    assert_eq!(manager.status().clients, 0);

    manager.shutdown().await;
}
