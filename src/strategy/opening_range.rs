//! Opening-range breakout strategy.
//!
//! A snapshot-only variant that reads the quote queue instead of arming the
//! print-driven detector. Two scenarios, decided by the open against the
//! previous close:
//!
//! - **Gap down**: buy the recovery, as soon as the best ask moves above
//!   the previous close.
//! - **Gap up**: buy the breakout, once the best ask clears a session high
//!   that has held for thirty seconds.
//!
//! Both fire at `last × 1.017` and are one-shot for the day.

use super::Strategy;
use crate::engine::{SignalSink, TradeSignal};
use crate::market::{Side, SnapshotEvent};
use crate::utils::price::{self, PriceTick};
use crate::utils::symbol::Board;
use crate::utils::time;
use std::collections::HashMap;
use tracing::{debug, info};

/// The session high must hold this long before its break is chased; the
/// high also stops refreshing once it has held this long.
const HIGH_HOLD_MS: i64 = 30 * 1_000;
/// The strategy only acts in the first ten minutes of the session.
const SESSION_WINDOW_MS: i64 = 10 * 60 * 1_000;
/// Entry price premium over the last trade price.
const ENTRY_MULTIPLIER: f64 = 1.017;
/// Signal size: one lot.
const LOT_QTY: u64 = 100;

const TYPE_ID: u8 = 5;

struct SymbolState {
    highest_price: f64,
    highest_time: i32,
    cap_bp: i64,
    signal_sent: bool,
    limit_up: PriceTick,
    current_date: i32,
}

impl SymbolState {
    fn new() -> Self {
        SymbolState {
            highest_price: 0.0,
            highest_time: 0,
            cap_bp: Board::Main.gain_cap_bp(),
            signal_sent: false,
            limit_up: 0,
            current_date: 0,
        }
    }
}

/// See the module docs. One instance tracks any number of symbols; state
/// resets on trading-date change.
pub struct OpeningRangeBreakoutStrategy {
    name: String,
    enabled: bool,
    states: HashMap<String, SymbolState>,
}

impl OpeningRangeBreakoutStrategy {
    /// A strategy instance with the given name.
    pub fn new(name: &str) -> Self {
        OpeningRangeBreakoutStrategy {
            name: name.to_string(),
            enabled: true,
            states: HashMap::new(),
        }
    }

    fn on_market_open(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        state.highest_price = price::wire_to_yuan(snapshot.high);
        state.highest_time = snapshot.time;
        state.signal_sent = false;
        state.limit_up = snapshot.limit_up.max(0) as PriceTick;
        state.current_date = snapshot.date;
        state.cap_bp = Board::of(&snapshot.symbol).gain_cap_bp();
        info!(
            symbol = %snapshot.symbol,
            date = snapshot.date,
            highest = state.highest_price,
            "new trading day"
        );
    }

    /// Gap down: the ask recovering above the previous close is the signal
    /// that red has turned green.
    fn check_gap_down_recovery(snapshot: &SnapshotEvent) -> bool {
        let best_ask = price::wire_to_yuan(snapshot.ask_prices[0]);
        let prev_close = price::wire_to_yuan(snapshot.prev_close);
        best_ask > prev_close
    }

    /// Gap up: chase the break of a session high that has held for thirty
    /// seconds.
    fn check_gap_up_break(state: &SymbolState, snapshot: &SnapshotEvent) -> bool {
        let best_ask = price::wire_to_yuan(snapshot.ask_prices[0]);
        let held_ms = time::session_diff_ms(state.highest_time, snapshot.time);
        best_ask > state.highest_price && held_ms >= HIGH_HOLD_MS
    }

    fn update_highest(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        // A high that has already held long enough is frozen; refreshing it
        // would restart the consolidation clock.
        if time::session_diff_ms(state.highest_time, snapshot.time) >= HIGH_HOLD_MS {
            debug!(symbol = %snapshot.symbol, "high held past the window, no longer refreshed");
            return;
        }
        let high = price::wire_to_yuan(snapshot.high);
        if high > state.highest_price {
            state.highest_price = high;
            state.highest_time = snapshot.time;
        }
    }

    fn trigger(
        state: &mut SymbolState,
        name: &str,
        snapshot: &SnapshotEvent,
        gap_down: bool,
        sink: &dyn SignalSink,
    ) {
        state.signal_sent = true;

        let mut order_price = (snapshot.last.max(0) as f64 * ENTRY_MULTIPLIER) as PriceTick;
        if state.limit_up > 0 && order_price > state.limit_up {
            order_price = state.limit_up;
        }

        info!(
            symbol = %snapshot.symbol,
            time = %time::format_mdtime(snapshot.time),
            order_price = %price::display(order_price),
            open = price::wire_to_yuan(snapshot.open),
            prev_close = price::wire_to_yuan(snapshot.prev_close),
            prev_high = state.highest_price,
            gap_down,
            "opening-range breakout signal"
        );

        sink.place_order(TradeSignal {
            symbol: snapshot.symbol.clone(),
            side: Side::Buy,
            price: order_price,
            quantity: LOT_QTY,
            trigger_time: snapshot.time,
            strategy_name: name.to_string(),
            strategy_type_id: TYPE_ID,
        });
    }
}

impl Strategy for OpeningRangeBreakoutStrategy {
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
        if state.signal_sent {
            return;
        }
        if snapshot.limit_up > 0 {
            state.limit_up = snapshot.limit_up as PriceTick;
        }
        if time::elapsed_since_open_ms(snapshot.time) > SESSION_WINDOW_MS {
            return;
        }

        let open = price::wire_to_yuan(snapshot.open);
        let prev_close = price::wire_to_yuan(snapshot.prev_close);
        if open <= 0.0 || prev_close <= 0.0 {
            return;
        }

        let high = price::wire_to_yuan(snapshot.high);
        let highest_gain_bp = price::gain_bp(high, prev_close);
        if highest_gain_bp >= state.cap_bp {
            debug!(
                symbol = %snapshot.symbol,
                highest_gain_bp,
                cap_bp = state.cap_bp,
                "gain cap exceeded, symbol abandoned for the day"
            );
            return;
        }

        let fired = if open < prev_close {
            Self::check_gap_down_recovery(snapshot)
        } else {
            Self::check_gap_up_break(state, snapshot)
        };
        if fired {
            Self::trigger(state, &self.name, snapshot, open < prev_close, sink);
            return;
        }

        Self::update_highest(state, snapshot);
    }
}
