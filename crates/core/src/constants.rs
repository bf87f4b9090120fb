/// Decimal places for display-oriented money formatting.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Widened precision for sub-unit prices (e.g. micro-cap coins).
pub const SMALL_PRICE_DECIMAL_PRECISION: u32 = 6;
