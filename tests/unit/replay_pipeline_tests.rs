//! Replay pipeline ordering and sharding guarantees.

use crate::support::*;
use fastlob::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::ThreadId;

/// Records `(composite_timestamp, seq, tag)` per symbol, plus the thread
/// each symbol's events arrived on.
#[derive(Default)]
struct Recorder {
    by_symbol: Mutex<HashMap<String, Vec<(i64, i64, &'static str)>>>,
    threads: Mutex<HashMap<String, Vec<ThreadId>>>,
}

impl Recorder {
    fn record(&self, symbol: &str, date: i32, time: i32, seq: i64, tag: &'static str) {
        let ts = date as i64 * 1_000_000_000 + time as i64;
        self.by_symbol
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push((ts, seq, tag));
        self.threads
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push(std::thread::current().id());
    }
}

impl MarketDataHandler for Recorder {
    fn on_snapshot(&self, snapshot: &SnapshotEvent) {
        self.record(&snapshot.symbol, snapshot.date, snapshot.time, -1, "snapshot");
    }

    fn on_order(&self, order: &OrderEvent) {
        self.record(&order.symbol, order.date, order.time, order.appl_seq, "order");
    }

    fn on_trade(&self, trade: &TradeEvent) {
        self.record(&trade.symbol, trade.date, trade.time, trade.appl_seq, "trade");
    }
}

#[test]
fn test_per_symbol_events_replay_in_key_order() {
    let mut replayer = Replayer::with_shards(4);

    // Deliberately buffered out of order, across two symbols.
    for symbol in ["600000.SH", "000001.SZ"] {
        replayer.add_order(limit_order(symbol, 3, 30, 93_100_200, 1, 100_000, 100));
        replayer.add_trade(buy_fill(symbol, 3, 31, 93_100_300, 100_000, 50));
        replayer.add_order(limit_order(symbol, 1, 10, 93_100_000, 1, 100_000, 100));
        replayer.add_snapshot(snapshot(symbol, 93_100_100, 100_000, 100_000, 100_000, 100_000));
        replayer.add_order(limit_order(symbol, 2, 20, 93_100_100, 2, 100_500, 100));
    }
    assert_eq!(replayer.event_count(), 10);

    let recorder = Recorder::default();
    replayer.replay(&recorder);

    let by_symbol = recorder.by_symbol.lock().unwrap();
    assert_eq!(by_symbol.len(), 2);
    for (symbol, events) in by_symbol.iter() {
        assert_eq!(events.len(), 5, "{symbol}");
        // Strict (timestamp, seq) order within the symbol.
        for pair in events.windows(2) {
            assert!(
                (pair[0].0, pair[0].1) <= (pair[1].0, pair[1].1),
                "{symbol}: {pair:?} out of order"
            );
        }
    }
}

#[test]
fn test_snapshot_sorts_before_prints_at_same_timestamp() {
    let mut replayer = Replayer::with_shards(2);
    let symbol = "600000.SH";

    // Order first into the buffer, snapshot second, both at 09:31:00.100.
    replayer.add_order(limit_order(symbol, 2, 20, 93_100_100, 2, 100_500, 100));
    replayer.add_snapshot(snapshot(symbol, 93_100_100, 100_000, 100_000, 100_000, 100_000));

    let recorder = Recorder::default();
    replayer.replay(&recorder);

    let by_symbol = recorder.by_symbol.lock().unwrap();
    let events = &by_symbol[symbol];
    assert_eq!(events[0].2, "snapshot");
    assert_eq!(events[1].2, "order");
}

#[test]
fn test_each_symbol_replays_on_one_thread() {
    let mut replayer = Replayer::with_shards(4);
    let symbols = ["600000.SH", "000001.SZ", "300750.SZ", "688981.SH", "600519.SH"];
    for (i, symbol) in symbols.iter().enumerate() {
        for k in 0..20 {
            replayer.add_order(limit_order(
                symbol,
                (i * 100 + k) as i64,
                (i * 100 + k) as i64,
                93_100_000 + k as i32,
                1,
                100_000,
                100,
            ));
        }
    }

    let recorder = Recorder::default();
    replayer.replay(&recorder);

    let threads = recorder.threads.lock().unwrap();
    for (symbol, ids) in threads.iter() {
        assert_eq!(ids.len(), 20, "{symbol}");
        assert!(
            ids.windows(2).all(|w| w[0] == w[1]),
            "{symbol} replayed on more than one thread"
        );
    }
}

#[test]
fn test_replay_with_single_shard() {
    let mut replayer = Replayer::with_shards(1);
    replayer.add_snapshot(snapshot("600000.SH", 93_100_000, 100_000, 100_000, 100_000, 100_000));
    replayer.add_snapshot(snapshot("000001.SZ", 93_100_000, 50_000, 50_000, 50_000, 50_000));

    let recorder = Recorder::default();
    replayer.replay(&recorder);
    assert_eq!(recorder.by_symbol.lock().unwrap().len(), 2);
}
