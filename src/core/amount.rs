//! Conversion of upstream decimal quotes into fixed-point fiat amounts.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

use super::error::ConversionError;
use super::rate::{FIAT_DECIMALS, FIAT_ONE};

/// Returns true when `code` can be represented as a fiat currency code.
pub fn is_supported_code(code: &str) -> bool {
    (2..=8).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Scales `raw` by `multiplier` and returns the result in fixed-point fiat units.
///
/// The multiplication happens in `f64`; the product is rendered with eight
/// decimals and parsed back so the stored amount matches what the feed
/// precision can express.
pub fn fiat_amount(code: &str, raw: &str, multiplier: f64) -> Result<i64, ConversionError> {
    if !is_supported_code(code) {
        return Err(ConversionError::UnsupportedCurrency(code.to_string()));
    }

    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConversionError::InvalidDecimal(raw.to_string()))?;

    let rendered = format!("{:.*}", FIAT_DECIMALS as usize, value * multiplier);
    let decimal = Decimal::from_str(&rendered)
        .map_err(|_| ConversionError::InvalidDecimal(rendered.clone()))?;

    let units = decimal
        .checked_mul(Decimal::from(FIAT_ONE))
        .and_then(|d| d.trunc().to_i64())
        .ok_or_else(|| ConversionError::InvalidDecimal(rendered.clone()))?;

    if units <= 0 {
        return Err(ConversionError::NonPositive {
            code: code.to_string(),
            amount: rendered,
        });
    }
    Ok(units)
}
