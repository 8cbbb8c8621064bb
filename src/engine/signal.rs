//! Trade signals and the sink they are handed to.
//!
//! A signal is a one-shot optimistic message: the framework does not retry,
//! confirm, or coalesce. The sink decouples strategy logic from execution;
//! backtests log, live contexts forward to a gateway (an external
//! collaborator).

use crate::market::Side;
use crate::utils::price::{self, PriceTick};
use crate::utils::time;
use serde::Serialize;
use tracing::info;

/// A buy/sell signal emitted by a strategy.
#[derive(Debug, Clone, Serialize)]
pub struct TradeSignal {
    /// Instrument code, e.g. `600550.SH`.
    pub symbol: String,
    /// Direction of the requested order.
    pub side: Side,
    /// Order price, scaled ×10⁴.
    pub price: PriceTick,
    /// Quantity in shares.
    pub quantity: u64,
    /// Exchange time (`HHMMSSmmm`) of the triggering event.
    pub trigger_time: i32,
    /// Name of the emitting strategy instance.
    pub strategy_name: String,
    /// Numeric id of the strategy type.
    pub strategy_type_id: u8,
}

/// Receives signals from strategies during their callbacks.
pub trait SignalSink: Send + Sync {
    /// Accepts a signal for execution or recording.
    fn place_order(&self, signal: TradeSignal);
}

/// Backtest sink: records signals to the log and drops them.
#[derive(Debug, Default)]
pub struct LogSignalSink;

impl SignalSink for LogSignalSink {
    fn place_order(&self, signal: TradeSignal) {
        info!(
            target: "fastlob::signal",
            symbol = %signal.symbol,
            side = %signal.side,
            price = %price::display(signal.price),
            quantity = signal.quantity,
            trigger_time = %time::format_mdtime(signal.trigger_time),
            strategy = %signal.strategy_name,
            "signal"
        );
    }
}
