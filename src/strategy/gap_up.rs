//! Gap-up breakout strategy.
//!
//! Qualifies symbols that open at or above the previous close, tracks the
//! session high through a 30-second lock window, then arms the breakout
//! detector at the locked high. Symbols that open below the previous close
//! are abandoned for the day.

use super::detector::BreakoutDetector;
use super::Strategy;
use crate::engine::{SignalSink, TradeSignal};
use crate::market::{OrderEvent, Side, SnapshotEvent, TradeEvent};
use crate::orderbook::FastOrderBook;
use crate::utils::price::{self, PriceTick};
use crate::utils::time;
use std::collections::HashMap;
use tracing::{debug, info};

/// The high must hold this long before it locks as the breakout level.
const HIGH_LOCK_MS: i64 = 30 * 1_000;
/// A lock outliving this without a trigger expires the symbol.
const CONSOLIDATION_LIMIT_MS: i64 = 180 * 1_000;
/// The strategy only acts in the first ten minutes of the session.
const SESSION_WINDOW_MS: i64 = 10 * 60 * 1_000;
/// Entry price premium over the locked target.
const ENTRY_MULTIPLIER: f64 = 1.014;
/// Signal size: one lot.
const LOT_QTY: u64 = 100;

const TYPE_ID: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for a valid open print.
    Idle,
    /// Gap-up confirmed; tracking the high through the lock window.
    TrackingHigh,
    /// Target locked; the detector watches the prints.
    Monitoring,
    /// Signalled, expired, or abandoned (no gap-up) for the day.
    Done,
}

struct SymbolState {
    phase: Phase,
    open_price: f64,
    prev_close: f64,
    highest_price: f64,
    highest_time: i32,
    detector: BreakoutDetector,
    signal_sent: bool,
    limit_up: PriceTick,
    current_date: i32,
}

impl SymbolState {
    fn new() -> Self {
        SymbolState {
            phase: Phase::Idle,
            open_price: 0.0,
            prev_close: 0.0,
            highest_price: 0.0,
            highest_time: 0,
            detector: BreakoutDetector::new(),
            signal_sent: false,
            limit_up: 0,
            current_date: 0,
        }
    }
}

/// See the module docs. One instance tracks any number of symbols; state
/// resets on trading-date change.
pub struct GapUpBreakoutStrategy {
    name: String,
    enabled: bool,
    states: HashMap<String, SymbolState>,
    tick_count: u64,
    order_count: u64,
    trade_count: u64,
}

impl GapUpBreakoutStrategy {
    /// A strategy instance with the given name.
    pub fn new(name: &str) -> Self {
        GapUpBreakoutStrategy {
            name: name.to_string(),
            enabled: true,
            states: HashMap::new(),
            tick_count: 0,
            order_count: 0,
            trade_count: 0,
        }
    }

    fn on_market_open(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        state.phase = Phase::Idle;
        state.open_price = 0.0;
        state.prev_close = 0.0;
        state.highest_price = 0.0;
        state.highest_time = 0;
        state.signal_sent = false;
        state.limit_up = snapshot.limit_up.max(0) as PriceTick;
        state.current_date = snapshot.date;
        state.detector.reset();
        state.detector.set_enabled(false);
        info!(symbol = %snapshot.symbol, date = snapshot.date, "new trading day");
    }

    fn detect_gap_up(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let open = price::wire_to_yuan(snapshot.open);
        let prev_close = price::wire_to_yuan(snapshot.prev_close);
        if open <= 0.0 || prev_close <= 0.0 {
            return;
        }
        state.open_price = open;
        state.prev_close = prev_close;

        if open >= prev_close {
            state.phase = Phase::TrackingHigh;
            state.highest_price = price::wire_to_yuan(snapshot.high);
            state.highest_time = snapshot.time;
            info!(
                symbol = %snapshot.symbol,
                open,
                prev_close,
                highest = state.highest_price,
                "gap-up detected, tracking the high"
            );
        } else {
            // Gapped down: nothing to chase today.
            state.phase = Phase::Done;
        }
    }

    fn track_high(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let held_ms = time::session_diff_ms(state.highest_time, snapshot.time);
        if held_ms >= HIGH_LOCK_MS {
            let target = price::from_yuan(state.highest_price);
            state.detector.set_target(target);
            state.detector.set_enabled(true);
            state.phase = Phase::Monitoring;
            info!(
                symbol = %snapshot.symbol,
                target_price = %price::display(target),
                "breakout level locked, monitoring prints"
            );
            return;
        }
        let high = price::wire_to_yuan(snapshot.high);
        if high > state.highest_price {
            state.highest_price = high;
            state.highest_time = snapshot.time;
            debug!(symbol = %snapshot.symbol, high, "new session high");
        }
    }

    /// Expires a locked symbol whose pause outlived the limit.
    fn expire_if_stale(state: &mut SymbolState, symbol: &str, mdtime: i32) -> bool {
        if time::session_diff_ms(state.highest_time, mdtime) <= CONSOLIDATION_LIMIT_MS {
            return false;
        }
        state.phase = Phase::Done;
        state.detector.set_enabled(false);
        info!(symbol = %symbol, "lock outlasted the limit, symbol expired for the day");
        true
    }

    fn trigger(
        state: &mut SymbolState,
        name: &str,
        symbol: &str,
        mdtime: i32,
        sink: &dyn SignalSink,
    ) {
        state.signal_sent = true;
        state.phase = Phase::Done;

        let target = state.detector.target();
        let stats = state.detector.stats();
        let mut order_price = (target as f64 * ENTRY_MULTIPLIER) as PriceTick;
        if state.limit_up > 0 && order_price > state.limit_up {
            order_price = state.limit_up;
        }

        info!(
            symbol = %symbol,
            time = %time::format_mdtime(mdtime),
            target_price = %price::display(target),
            order_price = %price::display(order_price),
            open = state.open_price,
            prev_close = state.prev_close,
            avg_volume = stats.avg_volume,
            buy_qty = stats.total_buy_qty,
            direct = stats.current_volume == 0,
            "gap-up breakout signal"
        );

        sink.place_order(TradeSignal {
            symbol: symbol.to_string(),
            side: Side::Buy,
            price: order_price,
            quantity: LOT_QTY,
            trigger_time: mdtime,
            strategy_name: name.to_string(),
            strategy_type_id: TYPE_ID,
        });
    }
}

impl Strategy for GapUpBreakoutStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_id(&self) -> u8 {
        TYPE_ID
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn on_start(&mut self) {
        info!(strategy = %self.name, "gap-up breakout strategy started");
    }

    fn on_stop(&mut self) {
        info!(
            strategy = %self.name,
            ticks = self.tick_count,
            orders = self.order_count,
            trades = self.trade_count,
            "gap-up breakout strategy stopped"
        );
    }

    fn on_tick(&mut self, snapshot: &SnapshotEvent, sink: &dyn SignalSink) {
        self.tick_count += 1;
        if !self.enabled || !time::is_market_open(snapshot.time) {
            return;
        }

        let state = self
            .states
            .entry(snapshot.symbol.clone())
            .or_insert_with(SymbolState::new);
        if state.current_date != snapshot.date {
            Self::on_market_open(state, snapshot);
        }
        if state.signal_sent || state.phase == Phase::Done {
            return;
        }
        if snapshot.limit_up > 0 {
            state.limit_up = snapshot.limit_up as PriceTick;
        }
        if time::elapsed_since_open_ms(snapshot.time) > SESSION_WINDOW_MS {
            return;
        }

        match state.phase {
            Phase::Idle => Self::detect_gap_up(state, snapshot),
            Phase::TrackingHigh => Self::track_high(state, snapshot),
            Phase::Monitoring => {
                if !Self::expire_if_stale(state, &snapshot.symbol, snapshot.time)
                    && state.detector.on_tick(snapshot)
                {
                    Self::trigger(state, &self.name, &snapshot.symbol, snapshot.time, sink);
                }
            }
            Phase::Done => {}
        }
    }

    fn on_order(&mut self, order: &OrderEvent, book: &FastOrderBook, sink: &dyn SignalSink) {
        self.order_count += 1;
        if !self.enabled {
            return;
        }
        let Some(state) = self.states.get_mut(&order.symbol) else {
            return;
        };
        if state.phase != Phase::Monitoring || state.signal_sent {
            return;
        }
        if Self::expire_if_stale(state, &order.symbol, order.time) {
            return;
        }
        if state.detector.on_order(order, book) {
            Self::trigger(state, &self.name, &order.symbol, order.time, sink);
        }
    }

    fn on_transaction(&mut self, trade: &TradeEvent, book: &FastOrderBook, sink: &dyn SignalSink) {
        self.trade_count += 1;
        if !self.enabled {
            return;
        }
        let Some(state) = self.states.get_mut(&trade.symbol) else {
            return;
        };
        if state.phase != Phase::Monitoring || state.signal_sent {
            return;
        }
        if Self::expire_if_stale(state, &trade.symbol, trade.time) {
            return;
        }
        if state.detector.on_transaction(trade, book) {
            Self::trigger(state, &self.name, &trade.symbol, trade.time, sink);
        }
    }
}
