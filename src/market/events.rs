//! The three exchange event types. Prices are integers scaled by 10⁴;
//! intraday time is `HHMMSSmmm`. Parsing from the venue text formats is an
//! external concern; these structs are the already-decoded form the core
//! consumes.

use super::enums::{Side, TradeBsFlag, Venue};
use serde::{Deserialize, Serialize};

/// Depth of the quote queues carried by a snapshot.
pub const DEPTH_LEVELS: usize = 10;

/// Periodic exchange snapshot of one instrument. Read-only observation:
/// snapshots never mutate the incremental book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotEvent {
    /// Instrument code, e.g. `600000.SH`.
    pub symbol: String,
    /// Trading date, `YYYYMMDD`.
    pub date: i32,
    /// Intraday time, `HHMMSSmmm`.
    pub time: i32,
    /// Previous close price.
    pub prev_close: i64,
    /// Day open price (0 before the open print).
    pub open: i64,
    /// Day high price.
    pub high: i64,
    /// Day low price.
    pub low: i64,
    /// Last trade price.
    pub last: i64,
    /// Daily limit-up price.
    pub limit_up: i64,
    /// Daily limit-down price.
    pub limit_down: i64,
    /// Ten-deep bid prices, inside-out.
    pub bid_prices: [i64; DEPTH_LEVELS],
    /// Ten-deep bid quantities, inside-out.
    pub bid_qtys: [i64; DEPTH_LEVELS],
    /// Ten-deep ask prices, inside-out.
    pub ask_prices: [i64; DEPTH_LEVELS],
    /// Ten-deep ask quantities, inside-out.
    pub ask_qtys: [i64; DEPTH_LEVELS],
    /// Cumulative number of trades for the day.
    pub num_trades: i64,
    /// Cumulative traded volume for the day.
    pub total_volume: i64,
    /// Cumulative traded value for the day.
    pub total_value: i64,
}

/// One order submission or cancellation print.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Instrument code.
    pub symbol: String,
    /// Trading date, `YYYYMMDD`.
    pub date: i32,
    /// Intraday time, `HHMMSSmmm`.
    pub time: i32,
    /// Venue-assigned order number; trade prints reference this.
    pub order_no: i64,
    /// Application sequence number, the secondary sort key within a day.
    pub appl_seq: i64,
    /// Wire order-kind code (see [`crate::market::OrderKind`]); kept raw so
    /// unknown codes surface as a non-fatal book error, not a parse failure.
    pub kind: i32,
    /// Wire side code (1 buy, 2 sell).
    pub side: i32,
    /// Order price, scaled ×10⁴.
    pub price: i64,
    /// Order quantity in shares.
    pub qty: i64,
    /// Wire venue source id.
    pub venue_id: i32,
}

impl OrderEvent {
    /// Decoded order side.
    pub fn order_side(&self) -> Side {
        Side::from_wire(self.side)
    }

    /// Decoded listing venue.
    pub fn venue(&self) -> Venue {
        Venue::from_wire(self.venue_id)
    }
}

/// One trade or trade-cancellation print.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Instrument code.
    pub symbol: String,
    /// Trading date, `YYYYMMDD`.
    pub date: i32,
    /// Intraday time, `HHMMSSmmm`.
    pub time: i32,
    /// Application sequence number, the secondary sort key within a day.
    pub appl_seq: i64,
    /// Referenced buy-side order number (0 when absent).
    pub buy_no: i64,
    /// Referenced sell-side order number (0 when absent).
    pub sell_no: i64,
    /// Wire trade type: 0 is a fill, 1/2/5/6/7/8 are cancellation variants.
    pub trade_type: i32,
    /// Wire aggressor flag (0 unknown, 1 buy, 2 sell).
    pub bs_flag: i32,
    /// Trade price, scaled ×10⁴.
    pub price: i64,
    /// Trade quantity in shares.
    pub qty: i64,
    /// Wire venue source id.
    pub venue_id: i32,
}

impl TradeEvent {
    /// True for the cancellation trade types (1, 2, 5, 6, 7, 8), which all
    /// deduct from the referenced order like a cancel.
    pub fn is_cancellation(&self) -> bool {
        matches!(self.trade_type, 1 | 2 | 5 | 6 | 7 | 8)
    }

    /// Decoded aggressor flag.
    pub fn aggressor(&self) -> TradeBsFlag {
        TradeBsFlag::from_wire(self.bs_flag)
    }

    /// Decoded listing venue.
    pub fn venue(&self) -> Venue {
        Venue::from_wire(self.venue_id)
    }
}
