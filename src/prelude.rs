//! Convenience re-exports for downstream code.
//!
//! ```
//! use fastlob::prelude::*;
//!
//! let engine = StrategyEngine::with_log_sink();
//! engine.add_strategy(
//!     "600550.SH",
//!     Box::new(PercentGainBreakoutStrategy::new("600550.SH_PGB")),
//! );
//! engine.start();
//! // ... feed events, typically through a Replayer ...
//! engine.stop();
//! ```

pub use crate::engine::{ControlMessage, LogSignalSink, SignalSink, StrategyEngine, TradeSignal};
pub use crate::market::{
    OrderEvent, OrderKind, Side, SnapshotEvent, TradeBsFlag, TradeEvent, Venue,
};
pub use crate::orderbook::{BookError, FastOrderBook, OrderNode, Pool, PriceLevel};
pub use crate::replay::{EventPayload, MarketDataHandler, MarketEvent, Replayer};
pub use crate::strategy::{
    BreakoutDetector, DetectorStats, GapUpBreakoutStrategy, HotSymbolBreakoutStrategy,
    OpeningRangeBreakoutStrategy, PercentGainBreakoutStrategy, RallyPauseBreakoutStrategy,
    Strategy,
};
pub use crate::utils::price::PriceTick;
pub use crate::utils::symbol::Board;
