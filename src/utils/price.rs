//! Integer price representation.
//!
//! Prices are carried as unsigned integers scaled by 10⁴ (1.2345 yuan =
//! `12345`). Wire payloads use `i64` in the same scale; the book narrows to
//! `u32` at its boundary.

/// Integer price scaled by 10⁴.
pub type PriceTick = u32;

/// Scale factor between integer prices and yuan.
pub const PRICE_SCALE: f64 = 10_000.0;

/// Converts an integer price to yuan.
pub fn to_yuan(price: PriceTick) -> f64 {
    price as f64 / PRICE_SCALE
}

/// Converts a yuan price to the integer representation, rounded to the
/// nearest tick so float artifacts never shift a price off by one.
pub fn from_yuan(yuan: f64) -> PriceTick {
    (yuan * PRICE_SCALE).round() as PriceTick
}

/// Converts a raw wire price (`i64`, same ×10⁴ scale) to yuan.
pub fn wire_to_yuan(raw: i64) -> f64 {
    raw as f64 / PRICE_SCALE
}

/// Basis points of `price` relative to `base`, truncated toward zero.
/// Returns 0 for a non-positive base.
pub fn gain_bp(price: f64, base: f64) -> i64 {
    if base <= 0.0 {
        return 0;
    }
    (((price - base) / base) * 10_000.0) as i64
}

/// Renders an integer price as yuan with four decimals for logs.
pub fn display(price: PriceTick) -> String {
    format!("{:.4}", to_yuan(price))
}
