//! Fiat-per-BTC rate feeds.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::reference::ReferenceRateResolver;
use super::util::{get_json, json_text};
use crate::core::amount::fiat_amount;
use crate::core::config::{FeedConfig, FeedShape};
use crate::core::{ExchangeRate, FetchError, RateTable};

/// A source of complete rate tables. `None` means nothing usable was fetched.
#[async_trait]
pub trait RateFeed: Send + Sync {
    async fn fetch(&self) -> Option<RateTable>;

    fn name(&self) -> &str;
}

/// One upstream feed, converted through the reference coin's BTC price.
pub struct FeedSource {
    client: Client,
    config: FeedConfig,
    excluded_codes: Vec<String>,
    reference: Arc<ReferenceRateResolver>,
}

impl FeedSource {
    pub fn new(
        client: Client,
        config: FeedConfig,
        excluded_codes: Vec<String>,
        reference: Arc<ReferenceRateResolver>,
    ) -> Self {
        Self {
            client,
            config,
            excluded_codes,
            reference,
        }
    }

    fn is_skipped(&self, code: &str) -> bool {
        code.is_empty() || code == "timestamp" || self.excluded_codes.iter().any(|c| c == code)
    }

    /// Lists `(code, fields)` entries of a response, dropping skipped codes.
    fn entries<'a>(
        &self,
        body: &'a Value,
    ) -> Result<Vec<(&'a str, &'a Map<String, Value>)>, FetchError> {
        let url = &self.config.url;
        let mut entries = Vec::new();
        match self.config.shape {
            FeedShape::Object => {
                let head = body
                    .as_object()
                    .ok_or_else(|| FetchError::parse(url, "expected a JSON object"))?;
                for (code, value) in head {
                    if self.is_skipped(code) {
                        continue;
                    }
                    let fields = value.as_object().ok_or_else(|| {
                        FetchError::parse(url, format!("entry {code} is not an object"))
                    })?;
                    entries.push((code.as_str(), fields));
                }
            }
            FeedShape::Array => {
                let head = body
                    .as_array()
                    .ok_or_else(|| FetchError::parse(url, "expected a JSON array"))?;
                for (index, item) in head.iter().enumerate() {
                    let fields = item.as_object().ok_or_else(|| {
                        FetchError::parse(url, format!("element {index} is not an object"))
                    })?;
                    let code = fields.get("code").and_then(Value::as_str).ok_or_else(|| {
                        FetchError::parse(url, format!("element {index} has no code"))
                    })?;
                    if self.is_skipped(code) {
                        continue;
                    }
                    entries.push((code, fields));
                }
            }
        }
        Ok(entries)
    }

    /// Builds a rate table from a parsed response body.
    ///
    /// For each currency the first field yielding a positive amount wins.
    pub fn parse_rates(&self, body: &Value, btc_rate: f64) -> Result<RateTable, FetchError> {
        let mut rates = RateTable::new();
        for (code, fields) in self.entries(body)? {
            for field in &self.config.fields {
                let Some(raw) = fields.get(field).and_then(json_text) else {
                    continue;
                };
                match fiat_amount(code, &raw, btc_rate) {
                    Ok(amount) => {
                        rates.insert(
                            code.to_string(),
                            ExchangeRate::new(code, amount, &self.config.name),
                        );
                        break;
                    }
                    Err(e) => warn!(
                        currency = code,
                        field = field.as_str(),
                        url = %self.config.url,
                        error = %e,
                        "Problem converting exchange rate"
                    ),
                }
            }
        }
        Ok(rates)
    }
}

#[async_trait]
impl RateFeed for FeedSource {
    #[instrument(name = "RateFeedFetch", skip(self), fields(source = %self.config.name))]
    async fn fetch(&self) -> Option<RateTable> {
        let Some(btc_rate) = self.reference.resolve().await.filter(|r| *r > 0.0) else {
            warn!(url = %self.config.url, "No reference rate, skipping feed");
            return None;
        };

        let start = Instant::now();
        let result = match get_json(&self.client, &self.config.url).await {
            Ok(body) => self
                .parse_rates(&body.value, btc_rate)
                .map(|rates| (rates, body.chars)),
            Err(e) => Err(e),
        };

        match result {
            Ok((rates, chars)) => {
                info!(
                    url = %self.config.url,
                    chars,
                    entries = rates.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Fetched exchange rates"
                );
                Some(rates)
            }
            Err(e) => {
                warn!(error = %e, "Problem fetching exchange rates");
                None
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
