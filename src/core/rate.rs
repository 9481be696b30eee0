//! Exchange rate value types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Number of decimal places carried by fixed-point fiat amounts.
pub const FIAT_DECIMALS: u32 = 8;

/// One whole fiat unit expressed in fixed-point units.
pub const FIAT_ONE: i64 = 100_000_000;

/// One whole coin expressed in its smallest units. Every rate is quoted per coin.
pub const COIN: i64 = 100_000_000;

/// Ticker codes of the coin denominations themselves. Never stored as fiat rates.
pub const EXCLUDED_CODES: [&str; 3] = ["BTC", "mBTC", "µBTC"];

/// A coin-to-fiat exchange rate together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub currency_code: String,
    pub coin_amount: i64,
    pub fiat_amount: i64,
    pub source: String,
}

impl ExchangeRate {
    /// Creates a rate for one coin.
    pub fn new(currency_code: &str, fiat_amount: i64, source: &str) -> Self {
        Self {
            currency_code: currency_code.to_string(),
            coin_amount: COIN,
            fiat_amount,
            source: source.to_string(),
        }
    }

    /// Fiat amount as a decimal number of whole units.
    pub fn fiat_decimal(&self) -> Decimal {
        Decimal::new(self.fiat_amount, FIAT_DECIMALS)
    }
}

impl Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.fiat_decimal(), self.currency_code)
    }
}

/// Rates keyed by currency code, ordered by code.
pub type RateTable = BTreeMap<String, ExchangeRate>;
