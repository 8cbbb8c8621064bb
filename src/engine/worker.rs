//! Per-symbol worker: owns the book and the strategy list, drains the
//! symbol's queue in FIFO order.

use super::control::ControlMessage;
use super::signal::SignalSink;
use crate::market::{OrderEvent, SnapshotEvent, TradeEvent};
use crate::orderbook::FastOrderBook;
use crate::strategy::Strategy;
use crate::utils::price::PriceTick;
use crossbeam::channel::Receiver;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Everything that can travel down a symbol queue. Control is data: it
/// interleaves with market events and is observed in FIFO order.
pub(super) enum WorkerMsg {
    Snapshot(SnapshotEvent),
    Order(OrderEvent),
    Trade(TradeEvent),
    AddStrategy(Box<dyn Strategy>),
    RemoveStrategy(String),
    Control(ControlMessage),
    Shutdown,
}

/// Single-writer owner of one symbol's book and strategies.
pub(super) struct SymbolWorker {
    symbol: String,
    book: Option<FastOrderBook>,
    strategies: Vec<Box<dyn Strategy>>,
    sink: Arc<dyn SignalSink>,
    dropped_pre_book: u64,
}

impl SymbolWorker {
    pub(super) fn new(symbol: &str, sink: Arc<dyn SignalSink>) -> Self {
        SymbolWorker {
            symbol: symbol.to_string(),
            book: None,
            strategies: Vec::new(),
            sink,
            dropped_pre_book: 0,
        }
    }

    /// Drains the queue until shutdown, then stops surviving strategies.
    pub(super) fn run(mut self, rx: Receiver<WorkerMsg>) {
        debug!(symbol = %self.symbol, "worker started");
        while let Ok(msg) = rx.recv() {
            match msg {
                WorkerMsg::Snapshot(snapshot) => self.handle_snapshot(&snapshot),
                WorkerMsg::Order(order) => self.handle_order(&order),
                WorkerMsg::Trade(trade) => self.handle_trade(&trade),
                WorkerMsg::AddStrategy(mut strategy) => {
                    info!(symbol = %self.symbol, strategy = strategy.name(), "strategy added");
                    strategy.on_start();
                    self.strategies.push(strategy);
                }
                WorkerMsg::RemoveStrategy(name) => {
                    if let Some(pos) = self.strategies.iter().position(|s| s.name() == name) {
                        let mut strategy = self.strategies.remove(pos);
                        strategy.on_stop();
                        info!(symbol = %self.symbol, strategy = %name, "strategy removed");
                    } else {
                        warn!(symbol = %self.symbol, strategy = %name, "remove: no such strategy");
                    }
                }
                WorkerMsg::Control(message) => self.handle_control(&message),
                WorkerMsg::Shutdown => break,
            }
        }
        for strategy in &mut self.strategies {
            strategy.on_stop();
        }
        debug!(
            symbol = %self.symbol,
            dropped_pre_book = self.dropped_pre_book,
            "worker stopped"
        );
    }

    fn handle_snapshot(&mut self, snapshot: &SnapshotEvent) {
        if self.book.is_none() {
            self.create_book(snapshot);
        }
        for strategy in &mut self.strategies {
            strategy.on_tick(snapshot, self.sink.as_ref());
        }
    }

    fn handle_order(&mut self, order: &OrderEvent) {
        let Some(book) = self.book.as_mut() else {
            self.note_pre_book_drop(order.time);
            return;
        };
        if let Err(err) = book.on_order(order) {
            error!(symbol = %self.symbol, %err, "order rejected by book");
            return;
        }
        let book: &FastOrderBook = book;
        for strategy in &mut self.strategies {
            strategy.on_order(order, book, self.sink.as_ref());
        }
    }

    fn handle_trade(&mut self, trade: &TradeEvent) {
        let Some(book) = self.book.as_mut() else {
            self.note_pre_book_drop(trade.time);
            return;
        };
        if let Err(err) = book.on_transaction(trade) {
            error!(symbol = %self.symbol, %err, "trade rejected by book");
            return;
        }
        let book: &FastOrderBook = book;
        for strategy in &mut self.strategies {
            strategy.on_transaction(trade, book, self.sink.as_ref());
        }
    }

    fn handle_control(&mut self, message: &ControlMessage) {
        match message {
            ControlMessage::EnableStrategy { name } => self.toggle_strategy(name, true),
            ControlMessage::DisableStrategy { name } => self.toggle_strategy(name, false),
            other => {
                for strategy in &mut self.strategies {
                    strategy.on_control(other);
                }
            }
        }
    }

    fn toggle_strategy(&mut self, name: &str, enabled: bool) {
        if let Some(strategy) = self.strategies.iter_mut().find(|s| s.name() == name) {
            strategy.set_enabled(enabled);
            info!(symbol = %self.symbol, strategy = %name, enabled, "strategy toggled");
        } else {
            warn!(symbol = %self.symbol, strategy = %name, "toggle: no such strategy");
        }
    }

    /// Sizes the book from the snapshot's daily limit band, falling back to
    /// ±20 % of the previous close when the feed carries no limits.
    fn create_book(&mut self, snapshot: &SnapshotEvent) {
        let band = if snapshot.limit_down > 0 && snapshot.limit_up >= snapshot.limit_down {
            Some((snapshot.limit_down, snapshot.limit_up))
        } else if snapshot.prev_close > 0 {
            let pc = snapshot.prev_close;
            Some((pc - pc / 5, pc + pc / 5))
        } else {
            None
        };
        let Some((lo, hi)) = band else {
            trace!(symbol = %self.symbol, "snapshot carries no usable price band yet");
            return;
        };
        if lo < 0 || hi > PriceTick::MAX as i64 {
            warn!(symbol = %self.symbol, lo, hi, "snapshot price band out of representable range");
            return;
        }
        info!(symbol = %self.symbol, lo, hi, "creating book");
        self.book = Some(FastOrderBook::new(
            &self.symbol,
            lo as PriceTick,
            hi as PriceTick,
        ));
    }

    fn note_pre_book_drop(&mut self, mdtime: i32) {
        self.dropped_pre_book += 1;
        if self.dropped_pre_book == 1 {
            warn!(
                symbol = %self.symbol,
                time = mdtime,
                "order/trade before first snapshot, no book to apply it to"
            );
        } else {
            trace!(symbol = %self.symbol, time = mdtime, "pre-book event dropped");
        }
    }
}
