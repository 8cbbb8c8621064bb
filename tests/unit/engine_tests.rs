//! Strategy engine tests: lifecycle, per-symbol FIFO delivery, book
//! ownership, and the control-as-data plane.

use crate::support::*;
use fastlob::prelude::*;
use std::sync::{Arc, Mutex};

/// Records every callback it receives, in order.
struct ProbeStrategy {
    name: String,
    enabled: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl ProbeStrategy {
    fn new(name: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        ProbeStrategy {
            name: name.to_string(),
            enabled: true,
            log,
        }
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl Strategy for ProbeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn on_start(&mut self) {
        self.push("start".to_string());
    }

    fn on_stop(&mut self) {
        self.push("stop".to_string());
    }

    fn on_tick(&mut self, snapshot: &SnapshotEvent, _sink: &dyn SignalSink) {
        if !self.enabled {
            return;
        }
        self.push(format!("tick:{}", snapshot.time));
    }

    fn on_order(&mut self, order: &OrderEvent, book: &FastOrderBook, _sink: &dyn SignalSink) {
        if !self.enabled {
            return;
        }
        // The book already reflects this print when the strategy sees it.
        self.push(format!(
            "order:{}:bid={:?}",
            order.order_no,
            book.get_best_bid()
        ));
    }

    fn on_transaction(&mut self, trade: &TradeEvent, book: &FastOrderBook, _sink: &dyn SignalSink) {
        if !self.enabled {
            return;
        }
        self.push(format!(
            "trade:{}:vol={}",
            trade.appl_seq,
            book.get_volume_at_price(trade.price.max(0) as PriceTick)
        ));
    }

    fn on_control(&mut self, message: &ControlMessage) {
        self.push(format!("control:{message:?}"));
    }
}

const SYM: &str = "600000.SH";

#[test]
fn test_worker_applies_print_before_strategy_observes_it() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy(SYM, Box::new(ProbeStrategy::new("probe", log.clone())));
    engine.start();

    engine.on_market_snapshot(&snapshot(SYM, 93_100_000, 100_000, 100_000, 100_000, 100_000));
    engine.on_market_order(&limit_order(SYM, 1, 10, 93_100_100, 1, 100_500, 1_000));
    engine.on_market_trade(&buy_fill(SYM, 99, 11, 93_100_200, 100_500, 0)); // malformed, book drops it
    engine.stop();

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            "start".to_string(),
            "tick:93100000".to_string(),
            // best bid reflects the order that triggered the callback
            "order:1:bid=Some(100500)".to_string(),
            "trade:11:vol=1000".to_string(),
            "stop".to_string(),
        ]
    );
}

#[test]
fn test_events_before_start_are_dropped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy(SYM, Box::new(ProbeStrategy::new("probe", log.clone())));

    engine.on_market_snapshot(&snapshot(SYM, 93_100_000, 100_000, 100_000, 100_000, 100_000));
    engine.start();
    engine.stop();

    let log = log.lock().unwrap();
    assert_eq!(*log, vec!["start".to_string(), "stop".to_string()]);
}

#[test]
fn test_prints_before_first_snapshot_are_dropped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy(SYM, Box::new(ProbeStrategy::new("probe", log.clone())));
    engine.start();

    // No snapshot yet: there is no book to apply the print to, so the
    // strategy must not observe it either.
    engine.on_market_order(&limit_order(SYM, 1, 10, 93_100_000, 1, 100_500, 1_000));
    engine.on_market_snapshot(&snapshot(SYM, 93_100_100, 100_000, 100_000, 100_000, 100_000));
    engine.on_market_order(&limit_order(SYM, 2, 11, 93_100_200, 1, 100_400, 500));
    engine.stop();

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            "start".to_string(),
            "tick:93100100".to_string(),
            "order:2:bid=Some(100400)".to_string(),
            "stop".to_string(),
        ]
    );
}

#[test]
fn test_control_interleaves_with_data_in_fifo_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy(SYM, Box::new(ProbeStrategy::new("probe", log.clone())));
    engine.start();

    engine.on_market_snapshot(&snapshot(SYM, 93_100_000, 100_000, 100_000, 100_000, 100_000));
    engine.disable_strategy(SYM, "probe");
    engine.on_market_snapshot(&snapshot(SYM, 93_100_100, 100_000, 100_000, 100_000, 100_000));
    engine.enable_strategy(SYM, "probe");
    engine.on_market_snapshot(&snapshot(SYM, 93_100_200, 100_000, 100_000, 100_000, 100_000));
    engine.stop();

    // The middle tick fell into the disabled window; the queue makes that
    // deterministic.
    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            "start".to_string(),
            "tick:93100000".to_string(),
            "tick:93100200".to_string(),
            "stop".to_string(),
        ]
    );
}

#[test]
fn test_watch_control_reaches_strategies() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy(SYM, Box::new(ProbeStrategy::new("probe", log.clone())));
    engine.start();
    engine.send_control(
        SYM,
        ControlMessage::WatchSymbol {
            symbol: SYM.to_string(),
        },
    );
    engine.stop();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 3);
    assert!(log[1].starts_with("control:WatchSymbol"));
}

#[test]
fn test_remove_strategy_fires_on_stop_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy(SYM, Box::new(ProbeStrategy::new("probe", log.clone())));
    engine.remove_strategy(SYM, "probe");
    engine.start();
    engine.stop();

    let log = log.lock().unwrap();
    assert_eq!(*log, vec!["start".to_string(), "stop".to_string()]);
}

#[test]
fn test_stop_is_idempotent() {
    let engine = StrategyEngine::with_log_sink();
    engine.start();
    assert!(engine.is_running());
    engine.stop();
    assert!(!engine.is_running());
    engine.stop();
    assert!(!engine.is_running());
}

#[test]
fn test_symbols_get_independent_workers_and_books() {
    let log_a = Arc::new(Mutex::new(Vec::new()));
    let log_b = Arc::new(Mutex::new(Vec::new()));
    let engine = StrategyEngine::with_log_sink();
    engine.add_strategy("600000.SH", Box::new(ProbeStrategy::new("a", log_a.clone())));
    engine.add_strategy("000001.SZ", Box::new(ProbeStrategy::new("b", log_b.clone())));
    engine.start();

    engine.on_market_snapshot(&snapshot("600000.SH", 93_100_000, 100_000, 100_000, 100_000, 100_000));
    engine.on_market_snapshot(&snapshot("000001.SZ", 93_100_000, 50_000, 50_000, 50_000, 50_000));
    engine.on_market_order(&limit_order("600000.SH", 1, 10, 93_100_100, 1, 100_500, 100));
    engine.on_market_order(&limit_order("000001.SZ", 1, 10, 93_100_100, 1, 50_500, 100));
    engine.stop();

    let log_a = log_a.lock().unwrap();
    let log_b = log_b.lock().unwrap();
    assert!(log_a.contains(&"order:1:bid=Some(100500)".to_string()));
    assert!(log_b.contains(&"order:1:bid=Some(50500)".to_string()));
}
