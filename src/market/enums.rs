//! Wire enums shared by the event model and the order book.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy (wire code 1).
    Buy,
    /// Sell (wire code 2).
    Sell,
}

impl Side {
    /// Decodes the wire BS flag of an order: 1 is buy, anything else sell,
    /// matching venue feed semantics.
    pub fn from_wire(code: i32) -> Side {
        if code == 1 { Side::Buy } else { Side::Sell }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order kind as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Market order (wire code 1). Never rests on a price level.
    Market,
    /// Limit order (wire code 2).
    Limit,
    /// Same-side-best pegged order (wire code 3). Resolved to a concrete
    /// resting price at insertion.
    BestPrice,
    /// Cancellation of a prior order (wire code 4, Shenzhen).
    Cancel,
    /// Cancellation of a prior order (wire code 10, Shanghai).
    CancelShanghai,
}

impl OrderKind {
    /// Decodes a wire order-kind code; unknown codes yield `None` and are
    /// treated as a non-fatal data error by the book.
    pub fn from_wire(code: i32) -> Option<OrderKind> {
        match code {
            1 => Some(OrderKind::Market),
            2 => Some(OrderKind::Limit),
            3 => Some(OrderKind::BestPrice),
            4 => Some(OrderKind::Cancel),
            10 => Some(OrderKind::CancelShanghai),
            _ => None,
        }
    }

    /// True for both cancellation codes.
    pub fn is_cancel(self) -> bool {
        matches!(self, OrderKind::Cancel | OrderKind::CancelShanghai)
    }
}

/// Aggressor flag on a trade print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeBsFlag {
    /// Aggressor unknown (wire code 0).
    Unknown,
    /// Buy-active trade (wire code 1).
    Buy,
    /// Sell-active trade (wire code 2).
    Sell,
}

impl TradeBsFlag {
    /// Decodes the wire trade BS flag.
    pub fn from_wire(code: i32) -> TradeBsFlag {
        match code {
            1 => TradeBsFlag::Buy,
            2 => TradeBsFlag::Sell,
            _ => TradeBsFlag::Unknown,
        }
    }
}

/// Listing venue of an instrument.
///
/// The venue decides trade-print semantics: Shenzhen prints reference both
/// resting orders, Shanghai prints reference only the passive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Venue {
    /// Shanghai Stock Exchange (wire source id 101).
    Shanghai,
    /// Shenzhen Stock Exchange (wire source id 102).
    Shenzhen,
}

impl Venue {
    /// Decodes the wire security-id source. Only 102 is Shenzhen; every
    /// other id is handled with Shanghai semantics.
    pub fn from_wire(source: i32) -> Venue {
        if source == 102 {
            Venue::Shenzhen
        } else {
            Venue::Shanghai
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_kind_codes() {
        assert_eq!(OrderKind::from_wire(1), Some(OrderKind::Market));
        assert_eq!(OrderKind::from_wire(2), Some(OrderKind::Limit));
        assert_eq!(OrderKind::from_wire(3), Some(OrderKind::BestPrice));
        assert_eq!(OrderKind::from_wire(4), Some(OrderKind::Cancel));
        assert_eq!(OrderKind::from_wire(10), Some(OrderKind::CancelShanghai));
        assert_eq!(OrderKind::from_wire(7), None);
        assert!(OrderKind::CancelShanghai.is_cancel());
        assert!(!OrderKind::Limit.is_cancel());
    }

    #[test]
    fn test_side_and_flags() {
        assert_eq!(Side::from_wire(1), Side::Buy);
        assert_eq!(Side::from_wire(2), Side::Sell);
        assert_eq!(TradeBsFlag::from_wire(0), TradeBsFlag::Unknown);
        assert_eq!(TradeBsFlag::from_wire(1), TradeBsFlag::Buy);
        assert_eq!(Venue::from_wire(102), Venue::Shenzhen);
        assert_eq!(Venue::from_wire(101), Venue::Shanghai);
    }
}
