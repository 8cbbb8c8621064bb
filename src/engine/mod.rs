//! Strategy engine: per-symbol event queues, worker threads, book
//! ownership, and the control plane.
//!
//! Each symbol gets exactly one worker thread, so per-symbol state has a
//! single writer. Ingress paths push onto the symbol's unbounded channel
//! without contention (replay sharding keeps each symbol on one producer
//! thread); control operations ride the same queue as data so their
//! ordering is deterministic.

mod control;
mod signal;
mod worker;

pub use control::ControlMessage;
pub use signal::{LogSignalSink, SignalSink, TradeSignal};

use crate::market::{OrderEvent, SnapshotEvent, TradeEvent};
use crate::replay::MarketDataHandler;
use crate::strategy::Strategy;
use crossbeam::channel::{unbounded, Sender};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info, warn};
use worker::{SymbolWorker, WorkerMsg};

struct WorkerHandle {
    tx: Sender<WorkerMsg>,
    join: JoinHandle<()>,
}

/// Routes market events and control messages to per-symbol workers.
///
/// Workers (and their books) are created lazily on the first message for a
/// symbol. `stop` is idempotent and joins every worker; dropping the engine
/// stops it.
pub struct StrategyEngine {
    workers: DashMap<String, WorkerHandle>,
    sink: Arc<dyn SignalSink>,
    running: AtomicBool,
}

impl StrategyEngine {
    /// An engine emitting signals into `sink`.
    pub fn new(sink: Arc<dyn SignalSink>) -> Self {
        StrategyEngine {
            workers: DashMap::new(),
            sink,
            running: AtomicBool::new(false),
        }
    }

    /// A backtest engine that logs signals instead of executing them.
    pub fn with_log_sink() -> Self {
        StrategyEngine::new(Arc::new(LogSignalSink))
    }

    /// Marks the engine live. Market events are dropped until this is
    /// called; strategy registration is accepted at any time.
    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!("strategy engine started");
    }

    /// Stops accepting market events, shuts every worker down and joins
    /// it. Safe to call more than once.
    pub fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        let symbols: Vec<String> = self.workers.iter().map(|e| e.key().clone()).collect();
        if !was_running && symbols.is_empty() {
            return;
        }
        for symbol in symbols {
            if let Some((_, handle)) = self.workers.remove(&symbol) {
                let _ = handle.tx.send(WorkerMsg::Shutdown);
                if handle.join.join().is_err() {
                    error!(symbol = %symbol, "worker panicked");
                }
            }
        }
        info!("strategy engine stopped");
    }

    /// True between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers a strategy on a symbol's worker; `on_start` fires on the
    /// worker thread when the message is consumed.
    pub fn add_strategy(&self, symbol: &str, strategy: Box<dyn Strategy>) {
        self.send(symbol, WorkerMsg::AddStrategy(strategy));
    }

    /// Removes a strategy by instance name; `on_stop` fires on the worker.
    pub fn remove_strategy(&self, symbol: &str, name: &str) {
        self.send(symbol, WorkerMsg::RemoveStrategy(name.to_string()));
    }

    /// Re-enables a strategy, ordered with the symbol's data events.
    pub fn enable_strategy(&self, symbol: &str, name: &str) {
        self.send_control(
            symbol,
            ControlMessage::EnableStrategy {
                name: name.to_string(),
            },
        );
    }

    /// Disables a strategy, ordered with the symbol's data events.
    pub fn disable_strategy(&self, symbol: &str, name: &str) {
        self.send_control(
            symbol,
            ControlMessage::DisableStrategy {
                name: name.to_string(),
            },
        );
    }

    /// Delivers a control message through the symbol's queue.
    pub fn send_control(&self, symbol: &str, message: ControlMessage) {
        self.send(symbol, WorkerMsg::Control(message));
    }

    /// Ingress for snapshots. Dropped (with a warning) unless running.
    pub fn on_market_snapshot(&self, snapshot: &SnapshotEvent) {
        if !self.guard_running(&snapshot.symbol) {
            return;
        }
        self.send(&snapshot.symbol, WorkerMsg::Snapshot(snapshot.clone()));
    }

    /// Ingress for order prints. Dropped (with a warning) unless running.
    pub fn on_market_order(&self, order: &OrderEvent) {
        if !self.guard_running(&order.symbol) {
            return;
        }
        self.send(&order.symbol, WorkerMsg::Order(order.clone()));
    }

    /// Ingress for trade prints. Dropped (with a warning) unless running.
    pub fn on_market_trade(&self, trade: &TradeEvent) {
        if !self.guard_running(&trade.symbol) {
            return;
        }
        self.send(&trade.symbol, WorkerMsg::Trade(trade.clone()));
    }

    fn guard_running(&self, symbol: &str) -> bool {
        if self.is_running() {
            return true;
        }
        warn!(symbol = %symbol, "engine not running, market event dropped");
        false
    }

    fn send(&self, symbol: &str, msg: WorkerMsg) {
        if symbol.is_empty() {
            warn!("event without symbol dropped");
            return;
        }
        let tx = self
            .workers
            .entry(symbol.to_string())
            .or_insert_with(|| self.spawn_worker(symbol))
            .tx
            .clone();
        if tx.send(msg).is_err() {
            error!(symbol = %symbol, "worker queue closed, message lost");
        }
    }

    fn spawn_worker(&self, symbol: &str) -> WorkerHandle {
        let (tx, rx) = unbounded();
        let worker = SymbolWorker::new(symbol, self.sink.clone());
        let join = std::thread::spawn(move || worker.run(rx));
        WorkerHandle { tx, join }
    }
}

impl Drop for StrategyEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MarketDataHandler for StrategyEngine {
    fn on_snapshot(&self, snapshot: &SnapshotEvent) {
        self.on_market_snapshot(snapshot);
    }

    fn on_order(&self, order: &OrderEvent) {
        self.on_market_order(order);
    }

    fn on_trade(&self, trade: &TradeEvent) {
        self.on_market_trade(trade);
    }
}
