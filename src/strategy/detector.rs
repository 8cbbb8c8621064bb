//! Rolling-window breakout detector.
//!
//! Watches one target price and fires when aggressive buy pressure has
//! consumed, or is about to consume, the resting supply there. A 200 ms
//! window (exchange time, not wall time) tracks the monitored level's
//! volume and the buy-flagged trade quantity at the target; the detector
//! fires when the buy pressure in the window matches the average resting
//! supply, or immediately once the target sits below the best ask.
//!
//! Firing is reported by the `on_*` return value; the owning strategy emits
//! its own signal. A fired detector stays latched until [`BreakoutDetector::reset`].

use crate::market::{OrderEvent, SnapshotEvent, TradeBsFlag, TradeEvent, DEPTH_LEVELS};
use crate::orderbook::FastOrderBook;
use crate::utils::price::PriceTick;
use crate::utils::time;
use std::collections::VecDeque;
use tracing::debug;

/// Rolling window length in exchange milliseconds.
const WINDOW_MS: i64 = 200;

/// How many ask levels above the target the sparse-level remapping will
/// search before giving up on an event.
const REMAP_DEPTH: usize = 10;

/// Window aggregates exposed for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorStats {
    /// Mean monitored-level volume over the window (`n`).
    pub avg_volume: f64,
    /// Sum of buy-flagged trade quantity at the target over the window
    /// (`Δn`).
    pub total_buy_qty: u64,
    /// Monitored-level volume of the latest sample.
    pub current_volume: u64,
    /// Number of samples in the window.
    pub window_len: usize,
}

#[derive(Debug, Clone, Copy)]
struct WindowSample {
    time: i32,
    level_vol: u64,
    buy_qty: u64,
}

/// Per-target-price breakout primitive. See the module docs for the
/// trigger conditions.
#[derive(Debug, Default)]
pub struct BreakoutDetector {
    target: PriceTick,
    enabled: bool,
    fired: bool,
    window: VecDeque<WindowSample>,
}

impl BreakoutDetector {
    /// A disarmed detector with no target.
    pub fn new() -> Self {
        BreakoutDetector::default()
    }

    /// Sets (or moves) the target price and clears all trigger state.
    pub fn set_target(&mut self, price: PriceTick) {
        self.target = price;
        self.reset();
    }

    /// The monitored target price.
    pub fn target(&self) -> PriceTick {
        self.target
    }

    /// Arms or disarms the detector. Disarming drops the window.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.window.clear();
        }
    }

    /// True while armed.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True once fired; stays latched until [`Self::reset`].
    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Unlatches the trigger and clears the window.
    pub fn reset(&mut self) {
        self.fired = false;
        self.window.clear();
    }

    /// Current window aggregates.
    pub fn stats(&self) -> DetectorStats {
        let mut stats = DetectorStats {
            avg_volume: 0.0,
            total_buy_qty: 0,
            current_volume: 0,
            window_len: self.window.len(),
        };
        if self.window.is_empty() {
            return stats;
        }
        let mut total = 0u64;
        for sample in &self.window {
            total += sample.level_vol;
            stats.total_buy_qty += sample.buy_qty;
        }
        stats.avg_volume = total as f64 / self.window.len() as f64;
        stats.current_volume = self.window.back().map_or(0, |s| s.level_vol);
        stats
    }

    /// Feeds an order print. Returns true when this call fired the trigger.
    pub fn on_order(&mut self, order: &OrderEvent, book: &FastOrderBook) -> bool {
        if !self.enabled || self.fired {
            return false;
        }
        let Some(level_vol) = self.volume_at_target(book) else {
            debug!(
                symbol = %order.symbol,
                target_price = self.target,
                time = %time::format_mdtime(order.time),
                "target above monitorable asks, skipping order"
            );
            return false;
        };
        self.push_sample(order.time, level_vol, 0);
        self.check_trigger(order.time)
    }

    /// Feeds a trade print. Buy pressure counts only buy-flagged fills at
    /// exactly the target price. Returns true when this call fired.
    pub fn on_transaction(&mut self, trade: &TradeEvent, book: &FastOrderBook) -> bool {
        if !self.enabled || self.fired {
            return false;
        }
        let Some(level_vol) = self.volume_at_target(book) else {
            debug!(
                symbol = %trade.symbol,
                target_price = self.target,
                time = %time::format_mdtime(trade.time),
                "target above monitorable asks, skipping trade"
            );
            return false;
        };
        let buy_qty =
            if trade.aggressor() == TradeBsFlag::Buy && trade.price == self.target as i64 {
                trade.qty.max(0) as u64
            } else {
                0
            };
        self.push_sample(trade.time, level_vol, buy_qty);
        self.check_trigger(trade.time)
    }

    /// Low-rate fallback driven by snapshots, for symbols where prints are
    /// sparse. Samples the target level from the ten-deep ask queue.
    /// Returns true when this call fired.
    pub fn on_tick(&mut self, snapshot: &SnapshotEvent) -> bool {
        if !self.enabled || self.fired {
            return false;
        }
        let Some(level_vol) = self.volume_from_quote_queue(snapshot) else {
            return false;
        };
        self.push_sample(snapshot.time, level_vol, 0);
        self.check_trigger(snapshot.time)
    }

    /// Resting volume at the monitored level, with sparse-level remapping:
    /// an empty target level is substituted by the nearest non-empty ask
    /// within [`REMAP_DEPTH`] levels above it. `Some(0)` means the target
    /// already sits below the best ask (broken); `None` means the target is
    /// above everything monitorable and the event should be skipped.
    fn volume_at_target(&self, book: &FastOrderBook) -> Option<u64> {
        let Some(best_ask) = book.get_best_ask() else {
            // No resting supply at all: the target is effectively broken.
            return Some(0);
        };
        if self.target < best_ask {
            return Some(0);
        }
        let vol = book.get_volume_at_price(self.target);
        if vol > 0 {
            return Some(vol);
        }
        for (price, volume) in book.get_ask_levels(REMAP_DEPTH) {
            if price > self.target && volume > 0 {
                return Some(volume);
            }
        }
        None
    }

    /// Snapshot analogue of [`Self::volume_at_target`] over the ten-deep
    /// ask queue.
    fn volume_from_quote_queue(&self, snapshot: &SnapshotEvent) -> Option<u64> {
        let target = self.target as i64;
        let mut best_ask = 0i64;
        let mut remapped = 0i64;
        for i in 0..DEPTH_LEVELS {
            let price = snapshot.ask_prices[i];
            let qty = snapshot.ask_qtys[i];
            if price <= 0 || qty <= 0 {
                continue;
            }
            if best_ask == 0 {
                best_ask = price;
            }
            if price == target {
                return Some(qty as u64);
            }
            if price > target && remapped == 0 {
                remapped = qty;
            }
        }
        // An absent quote queue is no information, unlike a genuinely
        // empty ask side in the book.
        if best_ask == 0 {
            return None;
        }
        if target < best_ask {
            return Some(0);
        }
        if remapped > 0 {
            return Some(remapped as u64);
        }
        None
    }

    fn push_sample(&mut self, mdtime: i32, level_vol: u64, buy_qty: u64) {
        self.window.push_back(WindowSample {
            time: mdtime,
            level_vol,
            buy_qty,
        });
        while let Some(front) = self.window.front() {
            if time::session_diff_ms(front.time, mdtime) <= WINDOW_MS {
                break;
            }
            self.window.pop_front();
        }
    }

    fn check_trigger(&mut self, mdtime: i32) -> bool {
        if self.fired || self.window.is_empty() {
            return false;
        }

        let latest_vol = self.window.back().map_or(0, |s| s.level_vol);
        if latest_vol == 0 {
            debug!(
                target_price = self.target,
                time = %time::format_mdtime(mdtime),
                "direct breakout: target below best ask"
            );
            self.fired = true;
            return true;
        }

        let mut total = 0u64;
        let mut buy = 0u64;
        for sample in &self.window {
            total += sample.level_vol;
            buy += sample.buy_qty;
        }
        let n = total as f64 / self.window.len() as f64;
        if n < 1.0 {
            return false;
        }

        if buy >= n as u64 {
            debug!(
                target_price = self.target,
                avg_volume = n,
                buy_qty = buy,
                window_len = self.window.len(),
                time = %time::format_mdtime(mdtime),
                "pressure breakout: window buy volume matched average supply"
            );
            self.fired = true;
            return true;
        }
        false
    }
}
