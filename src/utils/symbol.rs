//! Symbol suffix handling and board classification.
//!
//! A-share codes map to venues and boards by prefix: `6xxxxx` is Shanghai,
//! everything else Shenzhen; `60`/`00` prefixes are main-board, `30`/`68`
//! are growth-board (ChiNext / STAR) with a wider daily band.

/// Exchange board of a listed symbol, derived from its code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    /// Main board (`60xxxx.SH`, `00xxxx.SZ`), ±10 % daily band.
    Main,
    /// Growth board (`30xxxx.SZ`, `68xxxx.SH`), ±20 % daily band.
    Growth,
}

impl Board {
    /// Classifies a symbol by its two-digit prefix. Unknown prefixes are
    /// treated as main-board, matching the conservative default used when
    /// picking gain caps.
    pub fn of(symbol: &str) -> Board {
        match symbol.get(..2) {
            Some("30") | Some("68") => Board::Growth,
            _ => Board::Main,
        }
    }

    /// Daily gain cap in basis points (7 % main, 17 % growth) above which
    /// the breakout strategies abandon a symbol for the day.
    pub fn gain_cap_bp(self) -> i64 {
        match self {
            Board::Main => 700,
            Board::Growth => 1_700,
        }
    }
}

/// Appends the venue suffix when missing: codes starting with `6` get
/// `.SH`, everything else `.SZ`.
pub fn normalize(symbol: &str) -> String {
    if symbol.is_empty() || symbol.contains('.') {
        return symbol.to_string();
    }
    if symbol.starts_with('6') {
        format!("{symbol}.SH")
    } else {
        format!("{symbol}.SZ")
    }
}

/// Strips the venue suffix: `600759.SH` -> `600759`.
pub fn strip_suffix(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}

/// True for Shanghai-listed codes (prefix `6`).
pub fn is_shanghai(symbol: &str) -> bool {
    symbol.starts_with('6')
}

/// True for Shenzhen-listed codes.
pub fn is_shenzhen(symbol: &str) -> bool {
    !symbol.is_empty() && !symbol.starts_with('6')
}
