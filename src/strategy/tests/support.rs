//! Event builders and a collecting signal sink for strategy tests.

use crate::engine::{SignalSink, TradeSignal};
use crate::market::{OrderEvent, SnapshotEvent, TradeEvent};
use std::sync::Mutex;

pub const SYMBOL: &str = "600000.SH";
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

    pub fn len(&self) -> usize {
        self.signals.lock().unwrap().len()
    }
}

impl SignalSink for CollectSink {
    fn place_order(&self, signal: TradeSignal) {
        self.signals.lock().unwrap().push(signal);
    }
}

/// Snapshot with the fields the strategies read. Prices are raw ×10⁴.
pub fn snapshot(time: i32, prev_close: i64, open: i64, high: i64, last: i64) -> SnapshotEvent {
    SnapshotEvent {
        symbol: SYMBOL.to_string(),
        date: DATE,
        time,
        prev_close,
        open,
        high,
        low: last.min(prev_close),
        last,
        limit_up: 11_000,
        limit_down: 9_000,
        ..Default::default()
    }
}

/// Sell limit order print.
pub fn sell_limit(order_no: i64, time: i32, price: i64, qty: i64) -> OrderEvent {
    OrderEvent {
        symbol: SYMBOL.to_string(),
        date: DATE,
        time,
        order_no,
        appl_seq: order_no,
        kind: 2,
        side: 2,
        price,
        qty,
        venue_id: SH_VENUE,
    }
}

/// Shanghai buy-active fill against a resting sell.
pub fn buy_fill(sell_no: i64, time: i32, price: i64, qty: i64) -> TradeEvent {
    TradeEvent {
        symbol: SYMBOL.to_string(),
        date: DATE,
        time,
        appl_seq: time as i64,
        buy_no: 999_999,
        sell_no,
        trade_type: 0,
        bs_flag: 1,
        price,
        qty,
        venue_id: SH_VENUE,
    }
}
