//! Deterministic event replay: shard by symbol, sort per shard, dispatch
//! per shard thread.
//!
//! Events carry a composite key `(timestamp, seq)` with `timestamp =
//! date·10⁹ + HHMMSSmmm`. Snapshots use `seq = -1` so a snapshot at the
//! same timestamp as prints is delivered first — it describes the state as
//! of *before* those prints. All events of a symbol land in one shard, so
//! per-symbol order is preserved; interleaving across shards is
//! nondeterministic and irrelevant, symbols being independent.

use crate::market::{OrderEvent, SnapshotEvent, TradeEvent};
use std::thread;
use tracing::{debug, info};

/// Default shard (and replay thread) count.
const DEFAULT_SHARDS: usize = 4;

/// Receives replayed events. Implemented by
/// [`crate::engine::StrategyEngine`]; tests implement it with collecting
/// sinks.
pub trait MarketDataHandler: Sync {
    /// A market snapshot.
    fn on_snapshot(&self, snapshot: &SnapshotEvent);
    /// An order print.
    fn on_order(&self, order: &OrderEvent);
    /// A trade print.
    fn on_trade(&self, trade: &TradeEvent);
}

/// Payload of a replayable event.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Snapshot observation.
    Snapshot(SnapshotEvent),
    /// Order print.
    Order(OrderEvent),
    /// Trade print.
    Trade(TradeEvent),
}

/// One event with its composite sort key.
#[derive(Debug, Clone)]
pub struct MarketEvent {
    /// `date · 10⁹ + HHMMSSmmm`.
    pub timestamp: i64,
    /// Application sequence number; `-1` for snapshots.
    pub seq: i64,
    /// The event itself.
    pub payload: EventPayload,
}

impl MarketEvent {
    fn sort_key(&self) -> (i64, i64) {
        (self.timestamp, self.seq)
    }

    fn symbol(&self) -> &str {
        match &self.payload {
            EventPayload::Snapshot(s) => &s.symbol,
            EventPayload::Order(o) => &o.symbol,
            EventPayload::Trade(t) => &t.symbol,
        }
    }
}

fn compose_timestamp(date: i32, time: i32) -> i64 {
    date as i64 * 1_000_000_000 + time as i64
}

/// Buffers decoded events, then replays them in per-symbol order across
/// shard threads. Decoding the venue text files into events is an external
/// concern.
pub struct Replayer {
    shards: Vec<Vec<MarketEvent>>,
}

impl Replayer {
    /// A replayer with the default shard count.
    pub fn new() -> Self {
        Replayer::with_shards(DEFAULT_SHARDS)
    }

    /// A replayer with `shards` shard threads (at least one).
    pub fn with_shards(shards: usize) -> Self {
        assert!(shards >= 1, "shard count must be at least 1");
        Replayer {
            shards: vec![Vec::new(); shards],
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Total buffered events.
    pub fn event_count(&self) -> usize {
        self.shards.iter().map(Vec::len).sum()
    }

    /// Buffers a snapshot (`seq = -1`: sorts before same-timestamp prints).
    pub fn add_snapshot(&mut self, snapshot: SnapshotEvent) {
        self.push(MarketEvent {
            timestamp: compose_timestamp(snapshot.date, snapshot.time),
            seq: -1,
            payload: EventPayload::Snapshot(snapshot),
        });
    }

    /// Buffers an order print.
    pub fn add_order(&mut self, order: OrderEvent) {
        self.push(MarketEvent {
            timestamp: compose_timestamp(order.date, order.time),
            seq: order.appl_seq,
            payload: EventPayload::Order(order),
        });
    }

    /// Buffers a trade print.
    pub fn add_trade(&mut self, trade: TradeEvent) {
        self.push(MarketEvent {
            timestamp: compose_timestamp(trade.date, trade.time),
            seq: trade.appl_seq,
            payload: EventPayload::Trade(trade),
        });
    }

    /// Buffers a batch of snapshots.
    pub fn add_snapshots(&mut self, snapshots: impl IntoIterator<Item = SnapshotEvent>) {
        for snapshot in snapshots {
            self.add_snapshot(snapshot);
        }
    }

    /// Buffers a batch of order prints.
    pub fn add_orders(&mut self, orders: impl IntoIterator<Item = OrderEvent>) {
        for order in orders {
            self.add_order(order);
        }
    }

    /// Buffers a batch of trade prints.
    pub fn add_trades(&mut self, trades: impl IntoIterator<Item = TradeEvent>) {
        for trade in trades {
            self.add_trade(trade);
        }
    }

    /// Sorts every shard by `(timestamp, seq)` and replays each on its own
    /// thread, returning after all shard threads have joined.
    pub fn replay<H: MarketDataHandler>(&mut self, handler: &H) {
        for shard in &mut self.shards {
            shard.sort_by_key(MarketEvent::sort_key);
        }
        info!(
            events = self.event_count(),
            shards = self.shards.len(),
            "replay starting"
        );
        thread::scope(|scope| {
            for (shard_id, shard) in self.shards.iter().enumerate() {
                scope.spawn(move || {
                    for event in shard {
                        match &event.payload {
                            EventPayload::Snapshot(snapshot) => handler.on_snapshot(snapshot),
                            EventPayload::Order(order) => handler.on_order(order),
                            EventPayload::Trade(trade) => handler.on_trade(trade),
                        }
                    }
                    debug!(shard_id, events = shard.len(), "shard replay complete");
                });
            }
        });
        info!("replay finished");
    }

    fn push(&mut self, event: MarketEvent) {
        let shard = self.shard_of(event.symbol());
        self.shards[shard].push(event);
    }

    /// Polynomial rolling hash (`h = h·31 + byte`) over the symbol, modulo
    /// the shard count. Every event of a symbol lands in one shard.
    fn shard_of(&self, symbol: &str) -> usize {
        let mut h: u64 = 0;
        for byte in symbol.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u64);
        }
        (h % self.shards.len() as u64) as usize
    }
}

impl Default for Replayer {
    fn default() -> Self {
        Replayer::new()
    }
}
