use common::model::symbol;
use common::model::tick::{Side, TickSource};
use feed_engine::config::SynthesizerConfig;
use feed_engine::VolumeSynthesizer;

// Tight jitter bands and pinned burst odds make the output ranges
// checkable without fixing the RNG
fn pinned_config(burst_probability: f64) -> SynthesizerConfig {
    SynthesizerConfig {
        warmup_jitter: (0.999, 1.001),
        volume_jitter: (0.999, 1.001),
        burst_probability,
        burst_factor: (3.0, 8.0),
    }
}

#[test]
fn test_first_observation_is_neutral() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));
    let base = symbol::lookup("EURUSD").base_volume;

    let synthesis = synthesizer.calc("EURUSD", 1.0850, 1.0851);

    assert_eq!(synthesis.price_change, 0.0);
    assert_eq!(synthesis.mid, (1.0850 + 1.0851) / 2.0);
    assert!(synthesis.volume >= base * 0.999 && synthesis.volume <= base * 1.001);
}

#[test]
fn test_larger_move_synthesizes_more_volume() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    let small = synthesizer.calc("EURUSD", 1.0851, 1.0852);
    let large = synthesizer.calc("EURUSD", 1.0900, 1.0901);

    assert!(large.volume > small.volume);
    assert!(large.price_change > small.price_change);
}

#[test]
fn test_side_follows_bid_direction() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    let up = synthesizer.calc("EURUSD", 1.0852, 1.0853);
    assert_eq!(up.side, Side::Buy);

    let down = synthesizer.calc("EURUSD", 1.0849, 1.0850);
    assert_eq!(down.side, Side::Sell);
}

#[test]
fn test_volume_never_drops_below_base() {
    let config = SynthesizerConfig {
        volume_jitter: (0.7, 0.700001),
        burst_probability: 0.0,
        ..pinned_config(0.0)
    };
    let synthesizer = VolumeSynthesizer::new(config);
    let base = symbol::lookup("EURUSD").base_volume;

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    // Unchanged quote: jitter alone would land below the floor
    let synthesis = synthesizer.calc("EURUSD", 1.0850, 1.0851);
    assert!(synthesis.volume >= base);
}

#[test]
fn test_burst_multiplies_volume_when_pinned_on() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(1.0));
    let base = symbol::lookup("EURUSD").base_volume;

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    let synthesis = synthesizer.calc("EURUSD", 1.0850, 1.0851);
    assert!(synthesis.volume >= base * 3.0 * 0.999);
    assert!(synthesis.volume < base * 8.0 * 1.001);
}

#[test]
fn test_no_burst_when_pinned_off() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));
    let base = symbol::lookup("EURUSD").base_volume;

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    for _ in 0..50 {
        let synthesis = synthesizer.calc("EURUSD", 1.0850, 1.0851);
        assert!(synthesis.volume <= base * 1.001);
    }
}

#[test]
fn test_symbols_are_tracked_independently() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    // First observation of another symbol is neutral
    let other = synthesizer.calc("GBPUSD", 1.2650, 1.2651);
    assert_eq!(other.price_change, 0.0);

    // EURUSD state was untouched
    let next = synthesizer.calc("EURUSD", 1.0851, 1.0852);
    assert!(next.price_change > 0.0);
}

#[test]
fn test_reset_returns_symbol_to_warmup() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    synthesizer.reset(Some("EURUSD"));
    let synthesis = synthesizer.calc("EURUSD", 1.0900, 1.0901);
    assert_eq!(synthesis.price_change, 0.0);
}

#[test]
fn test_reset_all_clears_every_symbol() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));

    synthesizer.calc("EURUSD", 1.0850, 1.0851);
    synthesizer.calc("GBPUSD", 1.2650, 1.2651);
    synthesizer.reset(None);

    assert_eq!(synthesizer.calc("EURUSD", 1.0900, 1.0901).price_change, 0.0);
    assert_eq!(synthesizer.calc("GBPUSD", 1.2700, 1.2701).price_change, 0.0);
}

#[test]
fn test_into_tick_rounds_per_symbol_digits() {
    let synthesizer = VolumeSynthesizer::new(pinned_config(0.0));

    let synthesis = synthesizer.calc("EURUSD", 1.0850123, 1.0851567);
    let tick = synthesis.into_tick("EURUSD", 1.0850123, 1.0851567, 1717243200000, TickSource::Live);

    assert_eq!(tick.bid, 1.08501);
    assert_eq!(tick.ask, 1.08516);
    assert_eq!(tick.spread, symbol::round_to(1.0851567 - 1.0850123, 5));
    assert_eq!(tick.volume_synthetic, symbol::round_to(tick.volume_synthetic, 2));
    assert_eq!(tick.timestamp, 1717243200000);
    assert_eq!(tick.source, TickSource::Live);
}
