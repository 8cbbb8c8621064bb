//! Shared event builders and a collecting signal sink for the integration
//! tests.

use fastlob::prelude::*;
use std::sync::Mutex;

pub const DATE: i32 = 20240115;
pub const SH_VENUE: i32 = 101;

/// Records every signal it receives.
#[derive(Default)]
pub struct CollectSink {
    signals: Mutex<Vec<TradeSignal>>,
}

impl CollectSink {
    pub fn new() -> Self {
        CollectSink::default()
    }

    pub fn take(&self) -> Vec<TradeSignal> {
        std::mem::take(&mut self.signals.lock().unwrap())
    }
}

impl SignalSink for CollectSink {
    fn place_order(&self, signal: TradeSignal) {
        self.signals.lock().unwrap().push(signal);
    }
}

/// Snapshot with the strategy-relevant price fields set. Prices raw ×10⁴.
pub fn snapshot(symbol: &str, time: i32, prev_close: i64, open: i64, high: i64, last: i64) -> SnapshotEvent {
    SnapshotEvent {
        symbol: symbol.to_string(),
        date: DATE,
        time,
        prev_close,
        open,
        high,
        low: last.min(prev_close),
        last,
        limit_up: prev_close + prev_close / 10,
        limit_down: prev_close - prev_close / 10,
        ..Default::default()
    }
}

/// Limit order print. `side` is the wire code: 1 buy, 2 sell.
pub fn limit_order(
    symbol: &str,
    order_no: i64,
    appl_seq: i64,
    time: i32,
    side: i32,
    price: i64,
    qty: i64,
) -> OrderEvent {
    OrderEvent {
        symbol: symbol.to_string(),
        date: DATE,
        time,
        order_no,
        appl_seq,
        kind: 2,
        side,
        price,
        qty,
        venue_id: SH_VENUE,
    }
}

/// Shanghai buy-active fill against a resting sell.
pub fn buy_fill(
    symbol: &str,
    sell_no: i64,
    appl_seq: i64,
    time: i32,
    price: i64,
    qty: i64,
) -> TradeEvent {
    TradeEvent {
        symbol: symbol.to_string(),
        date: DATE,
        time,
        appl_seq,
        buy_no: 999_999,
        sell_no,
        trade_type: 0,
        bs_flag: 1,
        price,
        qty,
        venue_id: SH_VENUE,
    }
}
