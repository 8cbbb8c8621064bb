//! Strategy trait, the breakout detector primitive, and the breakout
//! strategy state machines built on it.
//!
//! Strategies are owned by the engine; each callback runs on the owning
//! symbol's worker thread with the book borrowed for the duration of the
//! call only. Firing detectors report through return values and strategies
//! emit signals through the [`SignalSink`] they are handed, so no callback
//! lifetimes cross components.

mod detector;
mod gap_up;
mod hot_watch;
mod opening_range;
mod percent_gain;
mod rally_pause;

mod tests;

pub use detector::{BreakoutDetector, DetectorStats};
pub use gap_up::GapUpBreakoutStrategy;
pub use hot_watch::HotSymbolBreakoutStrategy;
pub use opening_range::OpeningRangeBreakoutStrategy;
pub use percent_gain::PercentGainBreakoutStrategy;
pub use rally_pause::RallyPauseBreakoutStrategy;

use crate::engine::{ControlMessage, SignalSink};
use crate::market::{OrderEvent, SnapshotEvent, TradeEvent};
use crate::orderbook::FastOrderBook;

/// A stateful strategy driven by per-symbol market events.
///
/// The engine guarantees single-threaded delivery per symbol in replay
/// order; the book passed to `on_order`/`on_transaction` reflects exactly
/// the events already consumed from that symbol's queue, the triggering
/// event included.
pub trait Strategy: Send {
    /// Instance name, unique within the engine (e.g. `600550.SH_Breakout`).
    fn name(&self) -> &str;

    /// Numeric strategy-type id carried on emitted signals.
    fn type_id(&self) -> u8 {
        0
    }

    /// Disabled strategies keep receiving lifecycle calls but must treat
    /// data callbacks as no-ops.
    fn is_enabled(&self) -> bool;

    /// Flips the enabled flag; delivered through the control plane.
    fn set_enabled(&mut self, enabled: bool);

    /// Called once when the strategy is registered with a worker.
    fn on_start(&mut self) {}

    /// Called on removal or engine shutdown.
    fn on_stop(&mut self) {}

    /// A market snapshot for this symbol. Snapshots do not mutate the book.
    fn on_tick(&mut self, _snapshot: &SnapshotEvent, _sink: &dyn SignalSink) {}

    /// An order print, after it has been applied to the book.
    fn on_order(&mut self, _order: &OrderEvent, _book: &FastOrderBook, _sink: &dyn SignalSink) {}

    /// A trade print, after it has been applied to the book.
    fn on_transaction(
        &mut self,
        _trade: &TradeEvent,
        _book: &FastOrderBook,
        _sink: &dyn SignalSink,
    ) {
    }

    /// A control message that was not consumed by the worker itself
    /// (currently the watch/unwatch requests).
    fn on_control(&mut self, _message: &ControlMessage) {}
}
