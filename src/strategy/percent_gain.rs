//! Percent-gain breakout strategy.
//!
//! Chases confirmed strength: waits for the day's gain to clear a
//! board-specific initial threshold, then for a 27-second pause with no new
//! high, then arms the breakout detector at `max(breakout-threshold price,
//! locked high)`. Opening gaps can pre-satisfy phase 1. Boards differ in
//! thresholds: main-board 3 %/4 % with a 7 % cap, growth-board 5 %/6 % with
//! a 17 % cap.

use super::detector::BreakoutDetector;
use super::Strategy;
use crate::engine::{SignalSink, TradeSignal};
use crate::market::{OrderEvent, Side, SnapshotEvent, TradeEvent};
use crate::orderbook::FastOrderBook;
use crate::utils::price::{self, PriceTick};
use crate::utils::symbol::Board;
use crate::utils::time;
use std::collections::HashMap;
use tracing::{debug, info};

/// Pause with no new high required before the target locks.
const CONSOLIDATION_HOLD_MS: i64 = 27 * 1_000;
/// The strategy only acts in the first ten minutes of the session.
const SESSION_WINDOW_MS: i64 = 10 * 60 * 1_000;
/// Entry price premium over the locked target.
const ENTRY_MULTIPLIER: f64 = 1.014;
/// Signal size: one lot.
const LOT_QTY: u64 = 100;

const TYPE_ID: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GapScenario {
    /// Opening gain below the initial threshold; wait for phase 1.
    Normal,
    /// Opening gain in `[initial, breakout)`: phase 1 pre-satisfied.
    ModerateGap,
    /// Opening gain at or above the breakout threshold: chase a new high.
    LargeGap,
}

#[derive(Debug, Clone, Copy)]
struct Thresholds {
    initial_bp: i64,
    breakout_bp: i64,
    cap_bp: i64,
}

impl Thresholds {
    fn for_board(board: Board) -> Thresholds {
        match board {
            Board::Main => Thresholds {
                initial_bp: 300,
                breakout_bp: 400,
                cap_bp: 700,
            },
            Board::Growth => Thresholds {
                initial_bp: 500,
                breakout_bp: 600,
                cap_bp: 1_700,
            },
        }
    }
}

struct SymbolState {
    initial_threshold_met: bool,
    consolidation_met: bool,
    signal_sent: bool,
    highest_price: f64,
    highest_time: i32,
    thresholds: Thresholds,
    gap_scenario: GapScenario,
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
            initial_threshold_met: false,
            consolidation_met: false,
            signal_sent: false,
            highest_price: 0.0,
            highest_time: 0,
            thresholds: Thresholds::for_board(Board::Main),
            gap_scenario: GapScenario::Normal,
            detector: BreakoutDetector::new(),
            detector_armed: false,
            prev_close: 0.0,
            open_price: 0.0,
            limit_up: 0,
            current_date: 0,
        }
    }
}

/// See the module docs. One instance tracks any number of symbols, keyed by
/// the events it receives; state resets on trading-date change.
pub struct PercentGainBreakoutStrategy {
    name: String,
    enabled: bool,
    states: HashMap<String, SymbolState>,
}

impl PercentGainBreakoutStrategy {
    /// A strategy instance with the given name.
    pub fn new(name: &str) -> Self {
        PercentGainBreakoutStrategy {
            name: name.to_string(),
            enabled: true,
            states: HashMap::new(),
        }
    }

    fn on_market_open(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        state.highest_price = price::wire_to_yuan(snapshot.high);
        state.highest_time = snapshot.time;
        state.initial_threshold_met = false;
        state.consolidation_met = false;
        state.signal_sent = false;
        state.current_date = snapshot.date;
        state.detector_armed = false;
        state.detector.reset();
        state.detector.set_enabled(false);

        state.prev_close = price::wire_to_yuan(snapshot.prev_close);
        state.open_price = price::wire_to_yuan(snapshot.open);
        state.limit_up = snapshot.limit_up.max(0) as PriceTick;
        state.thresholds = Thresholds::for_board(Board::of(&snapshot.symbol));

        let opening_gain_bp = price::gain_bp(state.open_price, state.prev_close);
        state.gap_scenario = if opening_gain_bp < state.thresholds.initial_bp {
            GapScenario::Normal
        } else if opening_gain_bp < state.thresholds.breakout_bp {
            GapScenario::ModerateGap
        } else {
            GapScenario::LargeGap
        };
        if state.gap_scenario != GapScenario::Normal {
            state.initial_threshold_met = true;
        }

        debug!(
            symbol = %snapshot.symbol,
            prev_close = state.prev_close,
            open = state.open_price,
            opening_gain_bp,
            scenario = ?state.gap_scenario,
            "trading day initialized"
        );
    }

    fn check_initial_threshold(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let current = price::wire_to_yuan(snapshot.last);
        let gain = price::gain_bp(current, state.prev_close);
        if gain >= state.thresholds.initial_bp {
            state.initial_threshold_met = true;
            debug!(
                symbol = %snapshot.symbol,
                gain_bp = gain,
                threshold_bp = state.thresholds.initial_bp,
                time = %time::format_mdtime(snapshot.time),
                "phase 1 complete: initial gain threshold met"
            );
        }
    }

    fn check_consolidation(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let held_ms = time::session_diff_ms(state.highest_time, snapshot.time);
        if held_ms < CONSOLIDATION_HOLD_MS {
            return;
        }
        state.consolidation_met = true;

        let threshold_price = state.prev_close * (1.0 + state.thresholds.breakout_bp as f64 / 10_000.0);
        let target = price::from_yuan(threshold_price.max(state.highest_price));
        state.detector.set_target(target);
        state.detector.set_enabled(true);
        state.detector_armed = true;

        info!(
            symbol = %snapshot.symbol,
            held_s = held_ms / 1_000,
            target_price = %price::display(target),
            highest = state.highest_price,
            time = %time::format_mdtime(snapshot.time),
            "phase 2 complete: breakout target locked"
        );
    }

    fn update_highest(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        // The high is frozen once the consolidation pause has been accepted.
        if state.consolidation_met {
            return;
        }
        let high = price::wire_to_yuan(snapshot.high);
        if high > state.highest_price {
            state.highest_price = high;
            state.highest_time = snapshot.time;
            debug!(symbol = %snapshot.symbol, high, "new session high");
        }
    }

    fn session_window_closed(state: &mut SymbolState, mdtime: i32) -> bool {
        if time::elapsed_since_open_ms(mdtime) <= SESSION_WINDOW_MS {
            return false;
        }
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

        let chased_new_high = state.gap_scenario == GapScenario::LargeGap;
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
            chased_new_high,
            "breakout signal"
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

impl Strategy for PercentGainBreakoutStrategy {
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

        let high = price::wire_to_yuan(snapshot.high);
        let highest_gain_bp = price::gain_bp(high, state.prev_close);
        if highest_gain_bp >= state.thresholds.cap_bp {
            debug!(
                symbol = %snapshot.symbol,
                highest_gain_bp,
                cap_bp = state.thresholds.cap_bp,
                "gain cap exceeded, symbol abandoned for the day"
            );
            return;
        }

        if !state.initial_threshold_met {
            Self::check_initial_threshold(state, snapshot);
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
        if state.signal_sent || !state.detector_armed {
            return;
        }
        if Self::session_window_closed(state, order.time) {
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
        if state.signal_sent || !state.detector_armed {
            return;
        }
        if Self::session_window_closed(state, trade.time) {
            return;
        }
        if state.detector.on_transaction(trade, book) {
            Self::trigger(state, &self.name, &trade.symbol, trade.time, sink);
        }
    }
}
