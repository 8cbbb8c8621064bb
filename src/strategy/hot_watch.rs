//! Hot-symbol breakout strategy.
//!
//! The runtime-managed variant of the rally-pause idea: symbols are added
//! and removed mid-session through control messages. Every watched symbol
//! keeps a 60-second ring buffer of snapshots; when a symbol is added its
//! phase-2 high is seeded from that history instead of from the open, then
//! the usual pause-and-breakout machine runs (27-second pause, 3-minute
//! expiry).

use super::detector::BreakoutDetector;
use super::Strategy;
use crate::engine::{ControlMessage, SignalSink, TradeSignal};
use crate::market::{OrderEvent, Side, SnapshotEvent, TradeEvent};
use crate::orderbook::FastOrderBook;
use crate::utils::price::{self, PriceTick};
use crate::utils::time;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// How far back the seeding scan looks when a symbol is added.
const LOOKBACK_MS: i64 = 60 * 1_000;
/// Pause with no new high required before the target locks.
const CONSOLIDATION_HOLD_MS: i64 = 27 * 1_000;
/// A pause longer than this expires the symbol.
const CONSOLIDATION_LIMIT_MS: i64 = 180 * 1_000;
/// Ring-buffer capacity, about a minute of snapshots with headroom.
const RING_CAPACITY: usize = 2_000;
/// Entry price premium over the locked target.
const ENTRY_MULTIPLIER: f64 = 1.014;
/// Signal size: one lot.
const LOT_QTY: u64 = 100;

const TYPE_ID: u8 = 4;

/// Fixed-size ring of recent snapshots for one symbol.
struct SnapshotRing {
    buf: Vec<SnapshotEvent>,
    head: usize,
    count: usize,
}

impl SnapshotRing {
    fn new() -> Self {
        SnapshotRing {
            buf: vec![SnapshotEvent::default(); RING_CAPACITY],
            head: 0,
            count: 0,
        }
    }

    fn push(&mut self, snapshot: &SnapshotEvent) {
        self.buf[self.head] = snapshot.clone();
        self.head = (self.head + 1) % RING_CAPACITY;
        if self.count < RING_CAPACITY {
            self.count += 1;
        }
    }

    /// Highest `high` (and its time) among entries within `window_ms`
    /// before `now`, oldest-first so ties keep the earliest timestamp.
    fn highest_within(&self, now: i32, window_ms: i64) -> Option<(i64, i32)> {
        let start = (self.head + RING_CAPACITY - self.count) % RING_CAPACITY;
        let mut best: Option<(i64, i32)> = None;
        for i in 0..self.count {
            let snap = &self.buf[(start + i) % RING_CAPACITY];
            let age = time::session_diff_ms(snap.time, now);
            if age < 0 || age > window_ms {
                continue;
            }
            if best.is_none_or(|(high, _)| snap.high > high) {
                best = Some((snap.high, snap.time));
            }
        }
        best
    }

    fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }
}

struct SymbolState {
    needs_init: bool,
    consolidation_met: bool,
    signal_sent: bool,
    expired: bool,
    highest_price: PriceTick,
    highest_time: i32,
    added_time: i32,
    detector: BreakoutDetector,
    detector_armed: bool,
    prev_close: PriceTick,
    limit_up: PriceTick,
    history: SnapshotRing,
    current_date: i32,
}

impl SymbolState {
    fn new() -> Self {
        SymbolState {
            needs_init: true,
            consolidation_met: false,
            signal_sent: false,
            expired: false,
            highest_price: 0,
            highest_time: 0,
            added_time: 0,
            detector: BreakoutDetector::new(),
            detector_armed: false,
            prev_close: 0,
            limit_up: 0,
            history: SnapshotRing::new(),
            current_date: 0,
        }
    }
}

/// See the module docs. Watched symbols are managed through
/// [`ControlMessage::WatchSymbol`] / [`ControlMessage::UnwatchSymbol`] (or
/// the [`Self::watch`] / [`Self::unwatch`] methods directly in tests).
pub struct HotSymbolBreakoutStrategy {
    name: String,
    enabled: bool,
    states: HashMap<String, SymbolState>,
    active: HashSet<String>,
}

impl HotSymbolBreakoutStrategy {
    /// A strategy instance with the given name and no watched symbols.
    pub fn new(name: &str) -> Self {
        HotSymbolBreakoutStrategy {
            name: name.to_string(),
            enabled: true,
            states: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// Starts watching a symbol. Idempotent.
    pub fn watch(&mut self, symbol: &str) {
        if !self.active.insert(symbol.to_string()) {
            info!(strategy = %self.name, symbol, "already watching");
            return;
        }
        let state = self
            .states
            .entry(symbol.to_string())
            .or_insert_with(SymbolState::new);
        state.needs_init = true;
        state.consolidation_met = false;
        state.signal_sent = false;
        state.expired = false;
        state.detector_armed = false;
        state.detector.reset();
        state.detector.set_enabled(false);
        state.history.clear();
        info!(strategy = %self.name, symbol, "watching symbol");
    }

    /// Stops watching a symbol and drops its state.
    pub fn unwatch(&mut self, symbol: &str) {
        if !self.active.remove(symbol) {
            warn!(strategy = %self.name, symbol, "unwatch: not watching");
            return;
        }
        self.states.remove(symbol);
        info!(strategy = %self.name, symbol, "symbol dropped");
    }

    /// True while a symbol is being watched.
    pub fn is_watching(&self, symbol: &str) -> bool {
        self.active.contains(symbol)
    }

    /// Number of watched symbols.
    pub fn watched_count(&self) -> usize {
        self.active.len()
    }

    fn on_market_open(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        state.highest_price = snapshot.high.max(0) as PriceTick;
        state.highest_time = snapshot.time;
        state.needs_init = true;
        state.consolidation_met = false;
        state.signal_sent = false;
        state.expired = false;
        state.current_date = snapshot.date;
        state.detector_armed = false;
        state.detector.reset();
        state.detector.set_enabled(false);
        state.history.clear();
        state.prev_close = snapshot.prev_close.max(0) as PriceTick;
        state.limit_up = snapshot.limit_up.max(0) as PriceTick;
        debug!(symbol = %snapshot.symbol, date = snapshot.date, "new trading day");
    }

    /// Seeds the phase-2 high from the lookback window; with no history
    /// yet, the current snapshot's high stands in.
    fn init_from_history(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        state.added_time = snapshot.time;
        match state.history.highest_within(snapshot.time, LOOKBACK_MS) {
            Some((high, high_time)) => {
                state.highest_price = high.max(0) as PriceTick;
                state.highest_time = high_time;
            }
            None => {
                state.highest_price = snapshot.high.max(0) as PriceTick;
                state.highest_time = snapshot.time;
            }
        }
        info!(
            symbol = %snapshot.symbol,
            highest = %price::display(state.highest_price),
            highest_time = %time::format_mdtime(state.highest_time),
            added = %time::format_mdtime(state.added_time),
            "seeded from lookback history"
        );
    }

    fn check_consolidation(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        let held_ms = time::session_diff_ms(state.highest_time, snapshot.time);
        if held_ms < CONSOLIDATION_HOLD_MS {
            return;
        }
        state.consolidation_met = true;
        state.detector.set_target(state.highest_price);
        state.detector.set_enabled(true);
        state.detector_armed = true;
        info!(
            symbol = %snapshot.symbol,
            held_s = held_ms / 1_000,
            target_price = %price::display(state.highest_price),
            "pause complete, breakout target locked"
        );
    }

    fn update_highest(state: &mut SymbolState, snapshot: &SnapshotEvent) {
        if state.consolidation_met {
            return;
        }
        if time::session_diff_ms(state.highest_time, snapshot.time) >= CONSOLIDATION_HOLD_MS {
            return;
        }
        let high = snapshot.high.max(0) as PriceTick;
        if high > state.highest_price {
            state.highest_price = high;
            state.highest_time = snapshot.time;
            debug!(symbol = %snapshot.symbol, high = %price::display(high), "new high");
        }
    }

    fn expire_if_stale(state: &mut SymbolState, symbol: &str, mdtime: i32) -> bool {
        if time::session_diff_ms(state.highest_time, mdtime) <= CONSOLIDATION_LIMIT_MS {
            return false;
        }
        state.expired = true;
        state.detector_armed = false;
        state.detector.set_enabled(false);
        info!(symbol = %symbol, "pause outlasted the limit, symbol expired");
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
            prev_close = %price::display(state.prev_close),
            avg_volume = stats.avg_volume,
            buy_qty = stats.total_buy_qty,
            direct = stats.current_volume == 0,
            "hot-symbol breakout signal"
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

impl Strategy for HotSymbolBreakoutStrategy {
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

    fn on_control(&mut self, message: &ControlMessage) {
        match message {
            ControlMessage::WatchSymbol { symbol } => self.watch(symbol),
            ControlMessage::UnwatchSymbol { symbol } => self.unwatch(symbol),
            _ => {}
        }
    }

    fn on_tick(&mut self, snapshot: &SnapshotEvent, sink: &dyn SignalSink) {
        if !self.enabled || !time::is_market_open(snapshot.time) {
            return;
        }
        if !self.active.contains(&snapshot.symbol) {
            return;
        }
        let state = self
            .states
            .entry(snapshot.symbol.clone())
            .or_insert_with(SymbolState::new);
        if state.current_date != snapshot.date {
            Self::on_market_open(state, snapshot);
        }

        state.history.push(snapshot);

        if state.signal_sent || state.expired {
            return;
        }
        if snapshot.limit_up > 0 {
            state.limit_up = snapshot.limit_up as PriceTick;
        }

        if state.needs_init {
            Self::init_from_history(state, snapshot);
            state.needs_init = false;
        }

        if Self::expire_if_stale(state, &snapshot.symbol, snapshot.time) {
            return;
        }

        if !state.consolidation_met {
            Self::check_consolidation(state, snapshot);
        }

        if state.detector_armed && !state.signal_sent && state.detector.on_tick(snapshot) {
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
        if Self::expire_if_stale(state, &order.symbol, order.time) {
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
        if Self::expire_if_stale(state, &trade.symbol, trade.time) {
            return;
        }
        if state.detector.on_transaction(trade, book) {
            Self::trigger(state, &self.name, &trade.symbol, trade.time, sink);
        }
    }
}
