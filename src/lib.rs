//! # Fast Order Book and Breakout Strategy Engine
//!
//! Market-data processing and strategy execution core for a Chinese A-share
//! (Shanghai/Shenzhen) high-frequency backtester and live engine. The crate
//! consumes a time-ordered stream of order-book events — order submissions,
//! cancellations, trade prints, and periodic snapshots — maintains a
//! per-instrument limit order book incrementally, and drives stateful
//! breakout-detection strategies that emit one-shot buy signals.
//!
//! ## Components
//!
//! - **[`orderbook::FastOrderBook`]** — a price-indexed book: one dense
//!   array slot per integer price across the daily limit band, O(1) updates
//!   with cursor-tracked best bid/ask, per-level FIFO queues of nodes held
//!   in a stable-index [`orderbook::Pool`]. The book is reconstructed from
//!   exchange prints and never crossed internally.
//! - **[`replay::Replayer`]** — deterministic event replay: events shard by
//!   symbol (polynomial rolling hash), sort per shard on the composite
//!   `(timestamp, sequence)` key, and dispatch on one OS thread per shard.
//!   Per-symbol order is strict; cross-symbol interleaving is free.
//! - **[`engine::StrategyEngine`]** — per-symbol SPSC queues feeding one
//!   worker thread per symbol. The worker owns the book (single writer),
//!   applies each print before strategies observe it, and consumes control
//!   messages from the same queue so control ordering is deterministic.
//! - **[`strategy::BreakoutDetector`]** — a 200 ms rolling-window primitive
//!   that fires when aggressive buy pressure at a target price matches the
//!   average resting supply, or immediately once the target is broken.
//! - **Strategy state machines** — gap-up, percent-gain, rally-pause, and
//!   the runtime-managed hot-symbol variant, all composing the detector
//!   behind a qualification phase and a consolidation lock; plus the
//!   snapshot-only opening-range variant that reads the quote queue
//!   directly.
//!
//! ## Determinism
//!
//! All time in the core is exchange intraday time (`HHMMSSmmm`) drawn from
//! event payloads; nothing reads a wall clock. Replaying the same events
//! yields the same books, the same trigger decisions, and the same signals.
//!
//! ## Prices
//!
//! Prices are integers scaled by 10⁴ (1.2345 yuan = `12345`) end to end;
//! see [`utils::price`].
//!
//! ## What this crate is not
//!
//! No matching or execution simulation (the book reflects exchange prints,
//! it does not cross orders), no portfolio or risk accounting, and no
//! market-making. File parsing, the command surface, persistence, and the
//! live gateway are external collaborators speaking [`replay::MarketDataHandler`],
//! [`engine::SignalSink`], and [`engine::ControlMessage`].

pub mod engine;
pub mod market;
pub mod orderbook;
pub mod replay;
pub mod strategy;
pub mod utils;

pub mod prelude;

pub use engine::{ControlMessage, LogSignalSink, SignalSink, StrategyEngine, TradeSignal};
pub use market::{OrderEvent, OrderKind, Side, SnapshotEvent, TradeBsFlag, TradeEvent, Venue};
pub use orderbook::{BookError, FastOrderBook, Pool};
pub use replay::{MarketDataHandler, Replayer};
pub use strategy::{
    BreakoutDetector, DetectorStats, GapUpBreakoutStrategy, HotSymbolBreakoutStrategy,
    OpeningRangeBreakoutStrategy, PercentGainBreakoutStrategy, RallyPauseBreakoutStrategy,
    Strategy,
};
pub use utils::price::PriceTick;
