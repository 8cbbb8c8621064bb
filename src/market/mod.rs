//! Market-data event model: wire enums and the three exchange event types
//! (snapshot, order, trade) consumed by the book and the strategies.

mod enums;
mod events;

pub use enums::{OrderKind, Side, TradeBsFlag, Venue};
pub use events::{OrderEvent, SnapshotEvent, TradeEvent, DEPTH_LEVELS};
