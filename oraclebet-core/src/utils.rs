//! # Utility Functions
//!
//! Conversions between on-ledger integers and the decimal strings people type
//! and read.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;

use crate::{error::Result, pricing::PRICE_SCALE, Amount, MarketError, ONE};

/// Decimal places of the native asset
pub const DECIMALS: u32 = 18;

/// Parse a plain decimal string ("0.5", "12") into base units.
pub fn parse_amount(input: &str) -> Result<Amount> {
    let value = Decimal::from_str(input.trim())
        .map_err(|e| MarketError::InvalidAmount(format!("'{input}': {e}")))?
        .normalize();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(MarketError::InvalidAmount(format!(
            "'{input}' is negative"
        )));
    }
    if value.scale() > DECIMALS {
        return Err(MarketError::InvalidAmount(format!(
            "'{input}' has more than {DECIMALS} decimal places"
        )));
    }

    let mantissa = value.mantissa().unsigned_abs();
    mantissa
        .checked_mul(10u128.pow(DECIMALS - value.scale()))
        .ok_or(MarketError::Overflow)
}

/// Render base units as a decimal string without trailing zeros.
pub fn format_amount(amount: Amount) -> String {
    match i128::try_from(amount)
        .ok()
        .and_then(|units| Decimal::try_from_i128_with_scale(units, DECIMALS).ok())
    {
        Some(value) => value.normalize().to_string(),
        None => {
            // Beyond Decimal's 96-bit mantissa
            let fraction = format!("{:018}", amount % ONE);
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                (amount / ONE).to_string()
            } else {
                format!("{}.{}", amount / ONE, fraction)
            }
        }
    }
}

/// Render a `PRICE_SCALE` fixed-point price with four decimals ("0.5000").
pub fn format_price(price: u128) -> String {
    format!("{:.4}", price_decimal(price).round_dp(4))
}

/// Render a price as an implied probability ("50.0%").
pub fn format_probability(price: u128) -> String {
    let percent = price_decimal(price) * Decimal::ONE_HUNDRED;
    format!("{:.1}%", percent.round_dp(1))
}

fn price_decimal(price: u128) -> Decimal {
    let price = price.min(PRICE_SCALE) as i128;
    Decimal::try_from_i128_with_scale(price, DECIMALS).unwrap_or(Decimal::ONE)
}

/// Format timestamp as human-readable string
pub fn format_timestamp(timestamp: u64) -> String {
    let dt = DateTime::from_timestamp(timestamp as i64, 0).unwrap_or_default();
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse a timestamp given as Unix seconds, RFC 3339, or a `YYYY-MM-DD` date
/// (midnight UTC).
pub fn parse_timestamp(timestamp_str: &str) -> Result<u64> {
    let input = timestamp_str.trim();
    if let Ok(seconds) = input.parse::<u64>() {
        return Ok(seconds);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return u64::try_from(dt.timestamp())
            .map_err(|_| MarketError::Other(format!("Timestamp before 1970: {input}")));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        if let Some(seconds) = midnight.and_then(|s| u64::try_from(s).ok()) {
            return Ok(seconds);
        }
    }
    Err(MarketError::Other(format!("Invalid timestamp: {timestamp_str}")))
}

/// Unix timestamp `days` days after `from`
pub fn days_from(from: u64, days: u64) -> u64 {
    from.saturating_add(days.saturating_mul(24 * 60 * 60))
}
