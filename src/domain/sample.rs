use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price observation for one symbol.
///
/// Samples are immutable; a newer fetch produces a new sample rather than
/// touching the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub symbol: String,
    pub price: Decimal,
    /// 24-hour change in percent. Zero when the stats endpoint was unavailable.
    pub change_24h: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        change_24h: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change_24h,
            timestamp,
        }
    }
}

/// Format an amount as `$12,345.67`, with a leading `-` for negatives.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", sign, grouped, frac_part)
}

/// Format a delta with an explicit sign: `+$200.00` / `-$12.50`.
pub fn format_signed_usd(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.round_dp(2).is_zero() {
        format_usd(amount)
    } else {
        format!("+{}", format_usd(amount.abs()))
    }
}
