//! Exchange intraday time arithmetic.
//!
//! All time in the core is exchange time in `HHMMSSmmm` form (e.g.
//! `093015500` = 09:30:15.500), drawn from event payloads. Durations are
//! never computed by subtracting raw `HHMMSSmmm` values; they go through
//! [`session_diff_ms`], which maps both endpoints to session-elapsed
//! milliseconds and skips the 11:30–13:00 lunch break.

/// Morning session open, 09:30:00.000.
pub const MORNING_OPEN: i32 = 93_000_000;
/// Morning session close, 11:30:00.000.
pub const MORNING_CLOSE: i32 = 113_000_000;
/// Afternoon session open, 13:00:00.000.
pub const AFTERNOON_OPEN: i32 = 130_000_000;

/// Length of the morning session in milliseconds (09:30–11:30).
pub const MORNING_SESSION_MS: i64 = 2 * 60 * 60 * 1000;

/// Returns true during continuous trading (09:30–11:30 or 13:00–15:00).
pub fn is_market_open(mdtime: i32) -> bool {
    let hhmm = mdtime / 100_000;
    (930..1130).contains(&hhmm) || (1300..1500).contains(&hhmm)
}

/// Milliseconds since midnight for an `HHMMSSmmm` timestamp.
pub fn ms_of_day(mdtime: i32) -> i64 {
    let h = (mdtime / 10_000_000) as i64;
    let m = ((mdtime / 100_000) % 100) as i64;
    let s = ((mdtime / 1_000) % 100) as i64;
    let ms = (mdtime % 1_000) as i64;
    h * 3_600_000 + m * 60_000 + s * 1_000 + ms
}

/// Session-elapsed milliseconds since the 09:30 open.
///
/// Piecewise monotone over the trading day: the lunch break maps onto a
/// single instant, so differences of this value are trading-time durations.
/// Pre-open timestamps map to negative values, which keeps ordering intact
/// for auction-phase data.
pub fn session_ms(mdtime: i32) -> i64 {
    let t = ms_of_day(mdtime);
    let open = ms_of_day(MORNING_OPEN);
    let close = ms_of_day(MORNING_CLOSE);
    let resume = ms_of_day(AFTERNOON_OPEN);

    if t < close {
        t - open
    } else if t < resume {
        MORNING_SESSION_MS
    } else {
        MORNING_SESSION_MS + (t - resume)
    }
}

/// Trading-time duration in milliseconds between two `HHMMSSmmm` timestamps.
///
/// Positive when `to` is later than `from`.
pub fn session_diff_ms(from: i32, to: i32) -> i64 {
    session_ms(to) - session_ms(from)
}

/// Milliseconds of trading elapsed since the morning open, clamped at zero
/// for pre-open timestamps.
pub fn elapsed_since_open_ms(mdtime: i32) -> i64 {
    session_ms(mdtime).max(0)
}

/// Renders `HHMMSSmmm` as `HH:MM:SS.mmm` for logs.
pub fn format_mdtime(mdtime: i32) -> String {
    let h = mdtime / 10_000_000;
    let m = (mdtime / 100_000) % 100;
    let s = (mdtime / 1_000) % 100;
    let ms = mdtime % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}
