//! Core `FastOrderBook` implementation.

use super::error::BookError;
use super::node::{OrderNode, PriceLevel};
use super::pool::{Pool, NIL};
use crate::market::{OrderEvent, OrderKind, Side, TradeBsFlag, TradeEvent, Venue};
use crate::utils::price::PriceTick;
use std::collections::HashMap;
use tracing::{error, trace, warn};

/// Initial node-pool reservation; the pool grows past this without
/// reallocating existing handles.
const DEFAULT_POOL_CAPACITY: usize = 100_000;

/// Initial reservation for the parked market-order list.
const PARKED_CAPACITY: usize = 1_000;

/// Price-indexed limit order book for one instrument.
///
/// The price domain `[min_price, max_price]` is fixed at construction and is
/// expected to span the daily limit band; every resting price of the trading
/// day must fall inside it. The book is reconstructed from exchange prints
/// and never crosses orders internally: adds post liquidity, trade and
/// cancel prints deduct it.
pub struct FastOrderBook {
    symbol: String,
    min_price: PriceTick,
    /// Dense level array indexed by `price - min_price`.
    levels: Vec<PriceLevel>,
    /// Offset of the best non-empty buy level, or [`NIL`].
    best_bid_idx: i32,
    /// Offset of the best non-empty sell level, or [`NIL`].
    best_ask_idx: i32,
    pool: Pool<OrderNode>,
    /// Venue order number -> pool handle for every live node.
    order_index: HashMap<i64, i32>,
    /// Market orders (and best-price orders that found an empty side),
    /// parked outside the level array.
    parked: Vec<i32>,
}

impl FastOrderBook {
    /// Creates a book covering `[min_price, max_price]` inclusive.
    ///
    /// # Panics
    /// Panics when `max_price < min_price`; sizing the band is the caller's
    /// contract, typically from the exchange's daily limit prices.
    pub fn new(symbol: &str, min_price: PriceTick, max_price: PriceTick) -> Self {
        assert!(
            max_price >= min_price,
            "price band empty: [{min_price}, {max_price}]"
        );
        let span = (max_price - min_price) as usize + 1;
        FastOrderBook {
            symbol: symbol.to_string(),
            min_price,
            levels: vec![PriceLevel::default(); span],
            best_bid_idx: NIL,
            best_ask_idx: NIL,
            pool: Pool::with_capacity(DEFAULT_POOL_CAPACITY),
            order_index: HashMap::with_capacity(DEFAULT_POOL_CAPACITY),
            parked: Vec::with_capacity(PARKED_CAPACITY),
        }
    }

    /// The instrument this book tracks.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Lower bound of the price domain.
    pub fn min_price(&self) -> PriceTick {
        self.min_price
    }

    /// Upper bound of the price domain.
    pub fn max_price(&self) -> PriceTick {
        self.min_price + (self.levels.len() as PriceTick - 1)
    }

    /// Applies an order print: add for market/limit/best-price kinds,
    /// volume deduction for the cancel kinds.
    ///
    /// Returns `Ok(false)` for non-fatal data errors (unknown kind,
    /// out-of-range price, unknown cancel reference).
    ///
    /// # Errors
    /// [`BookError::PoolExhausted`] when no node handle is left.
    pub fn on_order(&mut self, order: &OrderEvent) -> Result<bool, BookError> {
        let Some(kind) = OrderKind::from_wire(order.kind) else {
            warn!(
                symbol = %self.symbol,
                kind = order.kind,
                order_no = order.order_no,
                "unknown order kind, dropping"
            );
            return Ok(false);
        };

        if kind.is_cancel() {
            return Ok(self.cancel_order(order.order_no, order.qty.max(0) as u64));
        }

        if order.qty <= 0 || order.price < 0 || order.price > PriceTick::MAX as i64 {
            warn!(
                symbol = %self.symbol,
                order_no = order.order_no,
                price = order.price,
                qty = order.qty,
                "malformed order print, dropping"
            );
            return Ok(false);
        }

        self.add_order(
            order.order_no,
            kind,
            order.order_side(),
            order.price as PriceTick,
            order.qty as u64,
        )
    }

    /// Applies a trade print: cancellation variants deduct the side picked
    /// by the BS flag; fills deduct per venue semantics (Shenzhen both
    /// references, Shanghai the passive side only).
    ///
    /// Returns `Ok(false)` when any referenced order is unknown.
    pub fn on_transaction(&mut self, trade: &TradeEvent) -> Result<bool, BookError> {
        if trade.qty <= 0 {
            warn!(
                symbol = %self.symbol,
                appl_seq = trade.appl_seq,
                qty = trade.qty,
                "malformed trade print, dropping"
            );
            return Ok(false);
        }
        let qty = trade.qty as u64;

        if trade.is_cancellation() {
            let target = if trade.aggressor() == TradeBsFlag::Buy {
                trade.buy_no
            } else {
                trade.sell_no
            };
            return Ok(self.cancel_order(target, qty));
        }

        if trade.venue() == Venue::Shenzhen {
            return Ok(self.apply_fill_both(trade.buy_no, trade.sell_no, qty));
        }

        // Shanghai: the aggressor order never rested, so only the passive
        // side is deducted. A resting aggressor reference is a feed
        // inconsistency worth flagging, not a failure.
        match trade.aggressor() {
            TradeBsFlag::Buy => {
                if self.order_index.contains_key(&trade.buy_no) {
                    error!(
                        symbol = %self.symbol,
                        buy_no = trade.buy_no,
                        "shanghai buy-active trade references a resting buy order"
                    );
                }
                Ok(self.update_volume(trade.sell_no, qty))
            }
            TradeBsFlag::Sell => {
                if self.order_index.contains_key(&trade.sell_no) {
                    error!(
                        symbol = %self.symbol,
                        sell_no = trade.sell_no,
                        "shanghai sell-active trade references a resting sell order"
                    );
                }
                Ok(self.update_volume(trade.buy_no, qty))
            }
            TradeBsFlag::Unknown => Ok(self.apply_fill_both(trade.buy_no, trade.sell_no, qty)),
        }
    }

    /// Best bid price, or `None` when no buy order rests.
    pub fn get_best_bid(&self) -> Option<PriceTick> {
        (self.best_bid_idx != NIL).then(|| self.min_price + self.best_bid_idx as PriceTick)
    }

    /// Best ask price, or `None` when no sell order rests.
    pub fn get_best_ask(&self) -> Option<PriceTick> {
        (self.best_ask_idx != NIL).then(|| self.min_price + self.best_ask_idx as PriceTick)
    }

    /// Aggregate resting volume at a price; zero outside the domain.
    pub fn get_volume_at_price(&self, price: PriceTick) -> u64 {
        if !self.in_range(price) {
            return 0;
        }
        self.levels[self.level_offset(price)].total_volume
    }

    /// Up to `n` bid levels from the inside out (price descending).
    pub fn get_bid_levels(&self, n: usize) -> Vec<(PriceTick, u64)> {
        let mut out = Vec::with_capacity(n);
        let mut idx = self.best_bid_idx;
        while idx >= 0 && out.len() < n {
            if self.level_fronted_by(idx as usize, Side::Buy) {
                out.push((
                    self.min_price + idx as PriceTick,
                    self.levels[idx as usize].total_volume,
                ));
            }
            idx -= 1;
        }
        out
    }

    /// Up to `n` ask levels from the inside out (price ascending).
    pub fn get_ask_levels(&self, n: usize) -> Vec<(PriceTick, u64)> {
        let mut out = Vec::with_capacity(n);
        let max_idx = self.levels.len() as i32 - 1;
        let mut idx = self.best_ask_idx;
        while idx != NIL && idx <= max_idx && out.len() < n {
            if self.level_fronted_by(idx as usize, Side::Sell) {
                out.push((
                    self.min_price + idx as PriceTick,
                    self.levels[idx as usize].total_volume,
                ));
            }
            idx += 1;
        }
        out
    }

    /// Aggregate resting volume across all levels in `[lo, hi]`, clamped to
    /// the price domain. A tight scan over the dense array.
    pub fn get_ask_volume_in_range(&self, lo: PriceTick, hi: PriceTick) -> u64 {
        let lo = lo.max(self.min_price);
        let hi = hi.min(self.max_price());
        if lo > hi {
            return 0;
        }
        let start = self.level_offset(lo);
        let end = self.level_offset(hi);
        self.levels[start..=end].iter().map(|l| l.total_volume).sum()
    }

    /// Number of live orders (resting plus parked).
    pub fn order_count(&self) -> usize {
        self.order_index.len()
    }

    /// True when an order number maps to a live node.
    pub fn contains_order(&self, order_no: i64) -> bool {
        self.order_index.contains_key(&order_no)
    }

    /// Number of parked (non-resting) market orders.
    pub fn parked_count(&self) -> usize {
        self.parked.len()
    }

    /// The node pool backing this book.
    pub fn pool(&self) -> &Pool<OrderNode> {
        &self.pool
    }

    /// FIFO of `(order_no, remaining_qty)` on the level at `price`; empty
    /// outside the domain. Used for diagnostics and invariant checks.
    pub fn level_orders(&self, price: PriceTick) -> Vec<(i64, u64)> {
        let mut out = Vec::new();
        if !self.in_range(price) {
            return out;
        }
        let mut idx = self.levels[self.level_offset(price)].head;
        while idx != NIL {
            let node = self.pool.get(idx);
            out.push((node.order_no, node.qty));
            idx = node.next;
        }
        out
    }

    fn in_range(&self, price: PriceTick) -> bool {
        price >= self.min_price && ((price - self.min_price) as usize) < self.levels.len()
    }

    fn level_offset(&self, price: PriceTick) -> usize {
        (price - self.min_price) as usize
    }

    /// A level counts for a side only when its FIFO head is on that side;
    /// an uncrossed reconstruction can transiently queue both sides at one
    /// price.
    fn level_fronted_by(&self, lvl_idx: usize, side: Side) -> bool {
        let lvl = &self.levels[lvl_idx];
        lvl.total_volume > 0 && lvl.head != NIL && self.pool.get(lvl.head).side == side
    }

    fn add_order(
        &mut self,
        order_no: i64,
        kind: OrderKind,
        side: Side,
        price: PriceTick,
        qty: u64,
    ) -> Result<bool, BookError> {
        // Resolve the resting price before touching the pool so rejected
        // adds allocate nothing. `None` parks the node off-level.
        let resting = match kind {
            OrderKind::Market => None,
            OrderKind::Limit => {
                if !self.in_range(price) {
                    warn!(
                        symbol = %self.symbol,
                        order_no,
                        price,
                        "limit price outside the daily band, dropping"
                    );
                    return Ok(false);
                }
                Some(price)
            }
            // Pegs to the same-side best; an empty same side degenerates
            // to a parked market order, matching observed venue behavior.
            OrderKind::BestPrice => match side {
                Side::Buy => self.get_best_bid(),
                Side::Sell => self.get_best_ask(),
            },
            OrderKind::Cancel | OrderKind::CancelShanghai => return Ok(false),
        };

        let node_idx = self.pool.alloc();
        if node_idx == NIL {
            error!(symbol = %self.symbol, "order node pool exhausted");
            return Err(BookError::PoolExhausted {
                symbol: self.symbol.clone(),
            });
        }

        {
            let node = self.pool.get_mut(node_idx);
            node.order_no = order_no;
            node.qty = qty;
            node.kind = kind;
            node.side = side;
            node.original_price = price;
            node.resting_price = resting.unwrap_or(0);
            node.prev = NIL;
            node.next = NIL;
        }
        self.order_index.insert(order_no, node_idx);

        let Some(target) = resting else {
            self.parked.push(node_idx);
            trace!(symbol = %self.symbol, order_no, ?kind, %side, "parked market order");
            return Ok(true);
        };

        let lvl_idx = self.level_offset(target);
        self.push_level_tail(lvl_idx, node_idx);
        self.levels[lvl_idx].total_volume += qty;

        // Cursor can only improve on an add.
        let lvl = lvl_idx as i32;
        match side {
            Side::Buy => {
                if self.best_bid_idx == NIL || lvl > self.best_bid_idx {
                    self.best_bid_idx = lvl;
                }
            }
            Side::Sell => {
                if self.best_ask_idx == NIL || lvl < self.best_ask_idx {
                    self.best_ask_idx = lvl;
                }
            }
        }
        Ok(true)
    }

    fn cancel_order(&mut self, order_no: i64, qty: u64) -> bool {
        self.update_volume(order_no, qty)
    }

    fn apply_fill_both(&mut self, buy_no: i64, sell_no: i64, qty: u64) -> bool {
        let b = self.update_volume(buy_no, qty);
        let s = self.update_volume(sell_no, qty);
        b && s
    }

    /// Deducts `delta` from the referenced order, shared by fills and
    /// cancels. Unlinks and frees the node when it empties, regressing the
    /// side cursor if its level was the best.
    fn update_volume(&mut self, order_no: i64, delta: u64) -> bool {
        let Some(&node_idx) = self.order_index.get(&order_no) else {
            trace!(symbol = %self.symbol, order_no, "volume update references unknown order");
            return false;
        };

        let (side, kind, resting_price, applied, remaining) = {
            let node = self.pool.get_mut(node_idx);
            let applied = delta.min(node.qty);
            if applied < delta {
                error!(
                    symbol = %self.symbol,
                    order_no,
                    remaining = node.qty,
                    delta,
                    "volume underflow, clamping to zero"
                );
            }
            node.qty -= applied;
            (node.side, node.kind, node.resting_price, applied, node.qty)
        };

        // Deduct the level aggregate by what actually came off the node so
        // the aggregate stays equal to the sum of its nodes.
        let on_level = kind != OrderKind::Market && self.in_range(resting_price);
        if on_level {
            let lvl_idx = self.level_offset(resting_price);
            self.levels[lvl_idx].total_volume =
                self.levels[lvl_idx].total_volume.saturating_sub(applied);
        }

        if remaining > 0 {
            return true;
        }

        if on_level {
            let lvl_idx = self.level_offset(resting_price);
            self.unlink_node(lvl_idx, node_idx);

            let lvl = lvl_idx as i32;
            if side == Side::Buy {
                if lvl == self.best_bid_idx && !self.level_fronted_by(lvl_idx, Side::Buy) {
                    self.rescan_best_bid();
                }
            } else if lvl == self.best_ask_idx && !self.level_fronted_by(lvl_idx, Side::Sell) {
                self.rescan_best_ask();
            }
        } else if let Some(pos) = self.parked.iter().position(|&i| i == node_idx) {
            // Swap-and-pop: O(1), order of the parked list is irrelevant.
            self.parked.swap_remove(pos);
        }

        self.order_index.remove(&order_no);
        self.pool.free(node_idx);
        true
    }

    fn push_level_tail(&mut self, lvl_idx: usize, node_idx: i32) {
        let tail = self.levels[lvl_idx].tail;
        if tail == NIL {
            self.levels[lvl_idx].head = node_idx;
            self.levels[lvl_idx].tail = node_idx;
        } else {
            self.pool.get_mut(tail).next = node_idx;
            self.pool.get_mut(node_idx).prev = tail;
            self.levels[lvl_idx].tail = node_idx;
        }
    }

    fn unlink_node(&mut self, lvl_idx: usize, node_idx: i32) {
        let (prev, next) = {
            let node = self.pool.get(node_idx);
            (node.prev, node.next)
        };
        if prev != NIL {
            self.pool.get_mut(prev).next = next;
        } else {
            self.levels[lvl_idx].head = next;
        }
        if next != NIL {
            self.pool.get_mut(next).prev = prev;
        } else {
            self.levels[lvl_idx].tail = prev;
        }
    }

    /// Called only when the level under the bid cursor emptied; walks down
    /// to the next level fronted by a buy order.
    fn rescan_best_bid(&mut self) {
        while self.best_bid_idx >= 0 {
            if self.level_fronted_by(self.best_bid_idx as usize, Side::Buy) {
                return;
            }
            self.best_bid_idx -= 1;
        }
    }

    /// Called only when the level under the ask cursor emptied; walks up to
    /// the next level fronted by a sell order.
    fn rescan_best_ask(&mut self) {
        let max_idx = self.levels.len() as i32 - 1;
        while self.best_ask_idx != NIL && self.best_ask_idx <= max_idx {
            if self.level_fronted_by(self.best_ask_idx as usize, Side::Sell) {
                return;
            }
            self.best_ask_idx += 1;
        }
        if self.best_ask_idx > max_idx {
            self.best_ask_idx = NIL;
        }
    }
}
