//! Picks the rate returned for a single-currency query.

use super::rate::{ExchangeRate, RateTable};

/// Currency used when neither the request nor the locale yields a rate.
pub const DEFAULT_EXCHANGE_CURRENCY: &str = "USD";

#[derive(Debug, Clone)]
pub struct RateSelector {
    default_code: Option<String>,
    fallback_code: String,
}

impl RateSelector {
    pub fn new(default_code: Option<String>, fallback_code: &str) -> Self {
        Self {
            default_code,
            fallback_code: fallback_code.to_string(),
        }
    }

    /// Requested code first, then the locale currency, then the fallback.
    pub fn select<'a>(
        &self,
        table: &'a RateTable,
        requested: Option<&str>,
    ) -> Option<&'a ExchangeRate> {
        requested
            .and_then(|code| table.get(code))
            .or_else(|| {
                self.default_code
                    .as_deref()
                    .and_then(|code| table.get(code))
            })
            .or_else(|| table.get(&self.fallback_code))
    }
}

impl Default for RateSelector {
    fn default() -> Self {
        Self::new(None, DEFAULT_EXCHANGE_CURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(codes: &[&str]) -> RateTable {
        codes
            .iter()
            .map(|c| (c.to_string(), ExchangeRate::new(c, 1, "test")))
            .collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let selector = RateSelector::new(Some("EUR".to_string()), "USD");
        let table = table_of(&["EUR", "GBP", "USD"]);
        let rate = selector.select(&table, Some("GBP")).unwrap();
        assert_eq!(rate.currency_code, "GBP");
    }

    #[test]
    fn test_falls_back_to_locale_then_fixed_code() {
        let selector = RateSelector::new(Some("EUR".to_string()), "USD");

        let table = table_of(&["EUR", "USD"]);
        assert_eq!(
            selector.select(&table, Some("JPY")).unwrap().currency_code,
            "EUR"
        );
        assert_eq!(selector.select(&table, None).unwrap().currency_code, "EUR");

        let table = table_of(&["GBP", "USD"]);
        assert_eq!(
            selector.select(&table, Some("JPY")).unwrap().currency_code,
            "USD"
        );
    }

    #[test]
    fn test_no_default_locale() {
        let selector = RateSelector::default();
        let table = table_of(&["USD"]);
        assert_eq!(selector.select(&table, None).unwrap().currency_code, "USD");
    }

    #[test]
    fn test_returns_none_when_nothing_matches() {
        let selector = RateSelector::new(Some("EUR".to_string()), "USD");
        assert!(selector.select(&RateTable::new(), None).is_none());
        assert!(selector.select(&table_of(&["GBP", "JPY"]), None).is_none());
    }
}
