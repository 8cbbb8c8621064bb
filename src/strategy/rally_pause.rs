//! Rally-pause breakout strategy.
//!
//! Detects a fast rally followed by a flat pause: a 60-second rolling price
//! window qualifies the symbol once the gain from the window low exceeds
//! 3 %; a 27-second pause with no new high (and the high above the previous
//! close) locks the high as the breakout target. A pause lasting past three
//! minutes expires the symbol for the day.

use super::detector::BreakoutDetector;
use super::Strategy;
use crate::engine::{SignalSink, TradeSignal};
use crate::market::{OrderEvent, Side, SnapshotEvent, TradeEvent};
use crate::orderbook::FastOrderBook;
use crate::utils::price::{self, PriceTick};
use crate::utils::symbol::Board;
use crate::utils::time;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// Qualification: gain from the rolling-window low must exceed this.
const GAIN_THRESHOLD_BP: i64 = 300;
/// Rolling price window length.
const GAIN_WINDOW_MS: i64 = 60 * 1_000;
/// Pause with no new high required before the target locks.
const CONSOLIDATION_HOLD_MS: i64 = 27 * 1_000;
/// A pause longer than this expires the symbol for the day.
const CONSOLIDATION_LIMIT_MS: i64 = 180 * 1_000;
/// The strategy only acts in the first ten minutes of the session.
const SESSION_WINDOW_MS: i64 = 10 * 60 * 1_000;
/// Entry price premium over the locked target.
const ENTRY_MULTIPLIER: f64 = 1.017;
/// Signal size: one lot.
const LOT_QTY: u64 = 100;

const TYPE_ID: u8 = 3;

#[derive(Debug, Clone, Copy)]
struct PriceRecord {
    price: f64,
    time: i32,
}

struct SymbolState {
    rally_detected: bool,
    consolidation_met: bool,
    signal_sent: bool,
    expired: bool,
    highest_price: f64,
    highest_time: i32,
    price_window: VecDeque<PriceRecord>,
    cap_bp: i64,
    detector: BreakoutDetector,
    detector_armed: bool,
    prev_close: f64,
    open_price: f64,
    limit_up: PriceTick,
    current_date: i32,
}

impl SymbolState {
    fn new() -> Self {
        SymbolState {
            rally_detected: false,
            consolidation_met: false,
            signal_sent: false,
            expired: false,
            highest_price: 0.0,
            highest_time: 0,
            price_window: VecDeque::new(),
            cap_bp: Board::Main.gain_cap_bp(),
            detector: BreakoutDetector::new(),
            detector_armed: false,
            prev_close: 0.0,
            open_price: 0.0,
            limit_up: 0,
            current_date: 0,
        }
    }
}

/// See the module docs. One instance tracks any number of symbols; state
/// resets on trading-date change.
pub struct RallyPauseBreakoutStrategy {
    name: String,
    enabled: bool,
    states: HashMap<String, SymbolState>,
}

impl RallyPauseBreakoutStrategy {
    /// A strategy instance with the given name.
    pub fn new(name: &str) -> Self {
        RallyPauseBreakoutStrategy {
            name: name.to_string(),
            enabled: true,
            states: HashMap::new(),
        }
    }

    fn on_market_open(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        state.highest_price = price::wire_to_yuan(snapshot.high);
        state.highest_time = snapshot.time;
        state.rally_detected = false;
        state.consolidation_met = false;
        state.signal_sent = false;
        state.expired = false;
        state.current_date = snapshot.date;
        state.detector_armed = false;
        state.detector.reset();
        state.detector.set_enabled(false);

        state.price_window.clear();
        state.price_window.push_back(PriceRecord {
            price: price::wire_to_yuan(snapshot.last),
            time: snapshot.time,
        });

        state.prev_close = price::wire_to_yuan(snapshot.prev_close);
        state.open_price = price::wire_to_yuan(snapshot.open);
        state.limit_up = snapshot.limit_up.max(0) as PriceTick;
        state.cap_bp = Board::of(&snapshot.symbol).gain_cap_bp();

        info!(
            symbol = %snapshot.symbol,
            prev_close = state.prev_close,
            open = state.open_price,
            "trading day initialized"
        );
    }

    fn update_price_window(state: &mut SymbolState, current: f64, mdtime: i32) {
        while let Some(front) = state.price_window.front() {
            if time::session_diff_ms(front.time, mdtime) > GAIN_WINDOW_MS {
                state.price_window.pop_front();
            } else {
                break;
            }
        }
        state.price_window.push_back(PriceRecord {
            price: current,
            time: mdtime,
        });
    }

    fn window_lowest(state: &SymbolState) -> Option<PriceRecord> {
        state
            .price_window
            .iter()
            .copied()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    fn check_rally(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let Some(lowest) = Self::window_lowest(state) else {
            return;
        };
        let current = price::wire_to_yuan(snapshot.last);
        let gain = price::gain_bp(current, lowest.price);
        if gain > GAIN_THRESHOLD_BP {
            state.rally_detected = true;
            state.highest_price = price::wire_to_yuan(snapshot.high);
            state.highest_time = snapshot.time;
            info!(
                symbol = %snapshot.symbol,
                gain_bp = gain,
                window_low = lowest.price,
                time = %time::format_mdtime(snapshot.time),
                "phase 1 complete: rally detected, waiting for the pause"
            );
        }
    }

    fn check_consolidation(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let held_ms = time::session_diff_ms(state.highest_time, snapshot.time);
        if held_ms > CONSOLIDATION_LIMIT_MS {
            state.expired = true;
            info!(
                symbol = %snapshot.symbol,
                held_s = held_ms / 1_000,
                "pause outlasted the limit, symbol expired for the day"
            );
            return;
        }

        // The locked high must be above water relative to the prior close.
        if state.highest_price <= state.prev_close {
            debug!(
                symbol = %snapshot.symbol,
                highest = state.highest_price,
                prev_close = state.prev_close,
                "high not above previous close, pause not accepted"
            );
            return;
        }

        if held_ms >= CONSOLIDATION_HOLD_MS {
            state.consolidation_met = true;

            let target = price::from_yuan(state.highest_price);
            state.detector.set_target(target);
            state.detector.set_enabled(true);
            state.detector_armed = true;

            info!(
                symbol = %snapshot.symbol,
                held_s = held_ms / 1_000,
                target_price = %price::display(target),
                highest = state.highest_price,
                "phase 2 complete: breakout target locked"
            );
        }
    }

    fn update_highest(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        if !state.rally_detected || state.consolidation_met {
            return;
        }
        // Once the pause clock has run out the high is frozen even before
        // the lock is observed on the next tick.
        if time::session_diff_ms(state.highest_time, snapshot.time) >= CONSOLIDATION_HOLD_MS {
            return;
        }
        let high = price::wire_to_yuan(snapshot.high);
        if high > state.highest_price {
            state.highest_price = high;
            state.highest_time = snapshot.time;
            debug!(symbol = %snapshot.symbol, high, "new session high");
        }
    }

    /// Phase-3 expiry shared by the print callbacks: a pause past the limit
    /// disarms the detector for good.
    fn expire_if_stale(state: &mut SymbolState, mdtime: i32) -> bool {
        if time::session_diff_ms(state.highest_time, mdtime) <= CONSOLIDATION_LIMIT_MS {
            return false;
        }
        state.expired = true;
        state.detector_armed = false;
        state.detector.set_enabled(false);
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
            "rally-pause breakout signal"
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

impl Strategy for RallyPauseBreakoutStrategy {
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

    fn on_tick(&mut self, snapshot: &SnapshotEvent, sink: &dyn SignalSink) {
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
        if state.signal_sent || state.expired {
            return;
        }
        if snapshot.limit_up > 0 {
            state.limit_up = snapshot.limit_up as PriceTick;
        }
        if time::elapsed_since_open_ms(snapshot.time) > SESSION_WINDOW_MS {
            return;
        }

        let high = price::wire_to_yuan(snapshot.high);
        let highest_gain_bp = price::gain_bp(high, state.prev_close);
        if highest_gain_bp >= state.cap_bp {
            debug!(
                symbol = %snapshot.symbol,
                highest_gain_bp,
                cap_bp = state.cap_bp,
                "gain cap exceeded, symbol abandoned for the day"
            );
            return;
        }

        Self::update_price_window(state, price::wire_to_yuan(snapshot.last), snapshot.time);

        if !state.rally_detected {
            Self::check_rally(state, snapshot);
        } else if !state.consolidation_met {
            Self::check_consolidation(state, snapshot);
        } else if state.detector_armed && state.detector.on_tick(snapshot) {
            Self::trigger(state, &self.name, &snapshot.symbol, snapshot.time, sink);
        }

        Self::update_highest(state, snapshot);
    }

    fn on_order(&mut self, order: &OrderEvent, book: &FastOrderBook, sink: &dyn SignalSink) {
        if !self.enabled {
            return;
        }
        let Some(state) = self.states.get_mut(&order.symbol) else {
            return;
        };
        if state.signal_sent || state.expired || !state.detector_armed {
            return;
        }
        if Self::expire_if_stale(state, order.time) {
            return;
        }
        if state.detector.on_order(order, book) {
            Self::trigger(state, &self.name, &order.symbol, order.time, sink);
        }
    }

    fn on_transaction(&mut self, trade: &TradeEvent, book: &FastOrderBook, sink: &dyn SignalSink) {
        if !self.enabled {
            return;
        }
        let Some(state) = self.states.get_mut(&trade.symbol) else {
            return;
        };
        if state.signal_sent || state.expired || !state.detector_armed {
            return;
        }
        if Self::expire_if_stale(state, trade.time) {
            return;
        }
        if state.detector.on_transaction(trade, book) {
            Self::trigger(state, &self.name, &trade.symbol, trade.time, sink);
        }
    }
}
