//! Order book error types.
//!
//! Data errors (unknown references, out-of-range prices, invalid kinds) are
//! non-fatal by design: book operations report them as `Ok(false)` so replay
//! keeps going. The only fatal condition is node-pool exhaustion.

use std::fmt;

/// Errors that abort a book operation.
#[derive(Debug)]
#[non_exhaustive]
pub enum BookError {
    /// The node pool ran out of 32-bit handles; no further orders can rest.
    PoolExhausted {
        /// Symbol of the affected book.
        symbol: String,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::PoolExhausted { symbol } => {
                write!(f, "order node pool exhausted for {symbol}")
            }
        }
    }
}

impl std::error::Error for BookError {}
