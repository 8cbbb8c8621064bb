//! Control-plane messages.
//!
//! Control rides the same per-symbol queue as market data, so its ordering
//! relative to events is observable and deterministic, and the worker never
//! takes a lock on the hot path.

use serde::{Deserialize, Serialize};

/// A control message addressed to one symbol's worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMessage {
    /// Re-enable a strategy by instance name.
    EnableStrategy {
        /// Strategy instance name.
        name: String,
    },
    /// Disable a strategy by instance name; its callbacks become no-ops
    /// until re-enabled.
    DisableStrategy {
        /// Strategy instance name.
        name: String,
    },
    /// Ask watching strategies to start monitoring a symbol mid-session.
    WatchSymbol {
        /// Instrument code to watch.
        symbol: String,
    },
    /// Ask watching strategies to drop a symbol.
    UnwatchSymbol {
        /// Instrument code to drop.
        symbol: String,
    },
}
