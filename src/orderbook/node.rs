//! Pool-resident order nodes and dense price-level slots.

use super::pool::NIL;
use crate::market::{OrderKind, Side};
use crate::utils::price::PriceTick;

/// One resting (or parked) order, addressed by its pool handle.
///
/// While resting, a node sits on exactly one price-level FIFO via the
/// intrusive `prev`/`next` handles, and its `resting_price` equals the price
/// of the level that contains it. Market orders and best-price orders that
/// found an empty side are parked instead and never appear on a level.
#[derive(Debug, Clone)]
pub struct OrderNode {
    /// Venue-assigned order number, unique within a trading day per venue.
    pub order_no: i64,
    /// Remaining quantity; the node is freed when this reaches zero.
    pub qty: u64,
    /// Order kind as submitted.
    pub kind: OrderKind,
    /// Order side.
    pub side: Side,
    /// Price as submitted, preserved for diagnostics.
    pub original_price: PriceTick,
    /// Level the node is posted at; for best-price orders resolved at
    /// insertion. Zero while parked.
    pub resting_price: PriceTick,
    /// Previous node on the same level, or [`NIL`].
    pub prev: i32,
    /// Next node on the same level, or [`NIL`].
    pub next: i32,
}

impl Default for OrderNode {
    fn default() -> Self {
        OrderNode {
            order_no: 0,
            qty: 0,
            kind: OrderKind::Limit,
            side: Side::Buy,
            original_price: 0,
            resting_price: 0,
            prev: NIL,
            next: NIL,
        }
    }
}

/// One slot of the dense level array, covering a single integer price.
///
/// `total_volume` always equals the sum of `qty` over the nodes on this
/// level's list. Because the reconstructed book is never crossed internally,
/// a level can transiently queue nodes of both sides.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Aggregate resting volume at this price.
    pub total_volume: u64,
    /// Head of the FIFO, or [`NIL`] when empty.
    pub head: i32,
    /// Tail of the FIFO, or [`NIL`] when empty.
    pub tail: i32,
}

impl Default for PriceLevel {
    fn default() -> Self {
        PriceLevel {
            total_volume: 0,
            head: NIL,
            tail: NIL,
        }
    }
}
