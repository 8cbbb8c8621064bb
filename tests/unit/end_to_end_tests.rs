//! End-to-end: replayed tick/print stream through the engine into a
//! percent-gain breakout signal.

use crate::support::*;
use fastlob::prelude::*;
use std::sync::Arc;

const SYM: &str = "600000.SH";

/// Prev close 1.0000, a climb past 3 % in twenty seconds, a 28-second
/// pause under 1.0400, then buy pressure sweeping the locked target.
#[test]
fn test_percent_gain_signal_from_replayed_stream() {
    let sink = Arc::new(CollectSink::new());
    let engine = StrategyEngine::new(sink.clone());
    engine.add_strategy(
        SYM,
        Box::new(PercentGainBreakoutStrategy::new("600000.SH_PGB")),
    );
    // A second, quiet symbol shows per-symbol independence.
    engine.add_strategy(
        "000001.SZ",
        Box::new(PercentGainBreakoutStrategy::new("000001.SZ_PGB")),
    );
    engine.start();

    let mut replayer = Replayer::with_shards(4);

    // Ticks: climb to +3.5 %, then oscillate below 1.0400.
    replayer.add_snapshots([
        snapshot(SYM, 93_100_000, 10_000, 10_000, 10_000, 10_000),
        snapshot(SYM, 93_110_000, 10_000, 10_000, 10_200, 10_200),
        snapshot(SYM, 93_120_000, 10_000, 10_000, 10_350, 10_350),
        snapshot(SYM, 93_135_000, 10_000, 10_000, 10_350, 10_330),
        snapshot(SYM, 93_148_000, 10_000, 10_000, 10_350, 10_340),
    ]);
    // The quiet symbol just drifts.
    replayer.add_snapshots([
        snapshot("000001.SZ", 93_100_000, 50_000, 50_000, 50_000, 50_000),
        snapshot("000001.SZ", 93_148_000, 50_000, 50_000, 50_100, 50_100),
    ]);

    // Supply rests at the 4 % target, then two buy prints sweep most of it.
    replayer.add_order(limit_order(SYM, 50, 100, 93_149_000, 2, 10_400, 1_000));
    replayer.add_trade(buy_fill(SYM, 50, 101, 93_149_050, 10_400, 400));
    replayer.add_trade(buy_fill(SYM, 50, 102, 93_149_100, 10_400, 400));

    replayer.replay(&engine);
    engine.stop();

    let signals = sink.take();
    assert_eq!(signals.len(), 1);
    let signal = &signals[0];
    assert_eq!(signal.symbol, SYM);
    assert_eq!(signal.side, Side::Buy);
    // min(target 10400 × 1.014, limit_up 11000)
    assert_eq!(signal.price, 10_545);
    assert_eq!(signal.quantity, 100);
    assert_eq!(signal.trigger_time, 93_149_100);
    assert_eq!(signal.strategy_name, "600000.SH_PGB");
    assert_eq!(signal.strategy_type_id, 2);
}

/// A replayed stream that never clears phase 1 produces no signal, and the
/// book still reconstructs correctly.
#[test]
fn test_flat_stream_produces_no_signal() {
    let sink = Arc::new(CollectSink::new());
    let engine = StrategyEngine::new(sink.clone());
    engine.add_strategy(SYM, Box::new(PercentGainBreakoutStrategy::new("pgb")));
    engine.start();

    let mut replayer = Replayer::new();
    replayer.add_snapshot(snapshot(SYM, 93_100_000, 10_000, 10_000, 10_000, 10_000));
    replayer.add_order(limit_order(SYM, 1, 10, 93_100_100, 2, 10_050, 700));
    replayer.add_trade(buy_fill(SYM, 1, 11, 93_100_200, 10_050, 200));

    replayer.replay(&engine);
    engine.stop();

    assert!(sink.take().is_empty());
}

/// The hot-symbol strategy driven end to end through control-as-data.
#[test]
fn test_hot_symbol_signal_after_watch_control() {
    let sink = Arc::new(CollectSink::new());
    let engine = StrategyEngine::new(sink.clone());
    engine.add_strategy(SYM, Box::new(HotSymbolBreakoutStrategy::new("hot")));
    engine.start();

    engine.send_control(
        SYM,
        ControlMessage::WatchSymbol {
            symbol: SYM.to_string(),
        },
    );

    // Seed, new high, 28-second pause, then a print against an empty ask
    // side fires directly.
    engine.on_market_snapshot(&snapshot(SYM, 93_100_000, 10_000, 10_050, 10_100, 10_100));
    engine.on_market_snapshot(&snapshot(SYM, 93_105_000, 10_000, 10_050, 10_250, 10_250));
    engine.on_market_snapshot(&snapshot(SYM, 93_133_000, 10_000, 10_050, 10_250, 10_240));
    engine.on_market_order(&limit_order(SYM, 60, 100, 93_134_000, 1, 10_100, 100));
    engine.stop();

    let signals = sink.take();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].strategy_type_id, 4);
    // min(target 10250 × 1.014, limit_up 11000)
    assert_eq!(signals[0].price, 10_393);
}
