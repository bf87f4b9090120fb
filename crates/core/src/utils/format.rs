//! Number formatting helpers for presentation adapters.
//!
//! The core returns typed decimals; the hosting conversational layer renders
//! text. These helpers keep the rendering consistent: money with thousands
//! separators, signed percents, and compact market-cap style figures.
//! Rounding is half-away-from-zero at the stated precision.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{
    DISPLAY_DECIMAL_PRECISION, SMALL_PRICE_DECIMAL_PRECISION,
};

/// Formats a monetary amount with a currency symbol and thousands
/// separators. Sub-unit amounts widen to six decimal places so micro-cap
/// prices do not collapse to "$0.00".
pub fn format_currency(value: Decimal, symbol: &str) -> String {
    let negative = value.is_sign_negative();
    let abs = value.abs();
    let precision = if abs < Decimal::ONE && !abs.is_zero() {
        SMALL_PRICE_DECIMAL_PRECISION
    } else {
        DISPLAY_DECIMAL_PRECISION
    };
    let rounded =
        abs.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", precision as usize, rounded);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text.as_str(), ""),
    };
    let grouped = group_thousands(int_part);
    let body = if frac_part.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac_part)
    };
    if negative {
        format!("-{}{}", symbol, body)
    } else {
        format!("{}{}", symbol, body)
    }
}

/// Formats a signed percentage with two decimal places and an explicit sign.
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_sign_negative() {
        format!("{:.2}%", rounded)
    } else {
        format!("+{:.2}%", rounded)
    }
}

/// Formats a large figure compactly: 1_230_000_000 becomes "1.23B".
/// Values below a thousand fall back to plain two-decimal formatting.
pub fn format_compact(value: Decimal) -> String {
    const TIERS: [(u64, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];

    let abs = value.abs();
    for (threshold, suffix) in TIERS {
        let threshold = Decimal::from(threshold);
        if abs >= threshold {
            let scaled = (value / threshold)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            return format!("{:.2}{}", scaled, suffix);
        }
    }
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
