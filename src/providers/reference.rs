//! Reference coin prices in BTC, used to convert BTC-denominated fiat feeds.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::util::{get_json, json_number};
use crate::core::FetchError;
use crate::core::config::{MarketConfig, ReferenceConfig};

/// A market quoting one reference coin in BTC.
#[async_trait]
pub trait ReferenceRate: Send + Sync {
    /// Price of one reference coin in BTC. Always strictly positive on success.
    async fn btc_rate(&self) -> Result<f64, FetchError>;

    fn name(&self) -> &str;
}

fn positive(url: &str, rate: f64) -> Result<f64, FetchError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(FetchError::parse(url, format!("non-positive rate {rate}")))
    }
}

/// Ticker endpoint shaped `{ "ticker": { "buy": .. } }`.
pub struct TickerBuyMarket {
    client: Client,
    url: String,
}

impl TickerBuyMarket {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ReferenceRate for TickerBuyMarket {
    async fn btc_rate(&self) -> Result<f64, FetchError> {
        let body = get_json(&self.client, &self.url).await?;
        let buy = body
            .value
            .get("ticker")
            .and_then(|ticker| ticker.get("buy"))
            .ok_or_else(|| FetchError::parse(&self.url, "missing ticker.buy"))?;
        let rate = json_number(buy)
            .ok_or_else(|| FetchError::parse(&self.url, format!("ticker.buy is not numeric: {buy}")))?;
        positive(&self.url, rate)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Market endpoint shaped `{ "Success": true, "Data": { "Label": .., "LastPrice": .. } }`.
///
/// Only accepted when `Data.Label` equals the expected trading pair.
pub struct LastPriceMarket {
    client: Client,
    url: String,
    label: String,
}

impl LastPriceMarket {
    pub fn new(client: Client, url: &str, label: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            label: label.to_string(),
        }
    }

    fn extract(&self, head: &Value) -> Result<f64, FetchError> {
        let success = match head.get("Success") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => return Err(FetchError::parse(&self.url, "missing Success flag")),
        };
        if !success {
            return Err(FetchError::parse(&self.url, "market reported failure"));
        }

        let data = head
            .get("Data")
            .filter(|d| d.is_object())
            .ok_or_else(|| FetchError::parse(&self.url, "missing Data object"))?;

        let label = data.get("Label").and_then(Value::as_str);
        if label != Some(self.label.as_str()) {
            return Err(FetchError::parse(
                &self.url,
                format!("unexpected trading pair {label:?}, wanted {}", self.label),
            ));
        }

        let rate = data
            .get("LastPrice")
            .and_then(json_number)
            .ok_or_else(|| FetchError::parse(&self.url, "missing Data.LastPrice"))?;
        positive(&self.url, rate)
    }
}

#[async_trait]
impl ReferenceRate for LastPriceMarket {
    async fn btc_rate(&self) -> Result<f64, FetchError> {
        let body = get_json(&self.client, &self.url).await?;
        self.extract(&body.value)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Tries each market once, in order, and returns the first usable rate.
pub struct ReferenceRateResolver {
    markets: Vec<Arc<dyn ReferenceRate>>,
}

impl ReferenceRateResolver {
    pub fn new(markets: Vec<Arc<dyn ReferenceRate>>) -> Self {
        Self { markets }
    }

    pub fn from_config(client: &Client, config: &ReferenceConfig) -> Self {
        let markets = config
            .markets
            .iter()
            .map(|market| -> Arc<dyn ReferenceRate> {
                match market {
                    MarketConfig::TickerBuy { url } => {
                        Arc::new(TickerBuyMarket::new(client.clone(), url))
                    }
                    MarketConfig::LastPrice { url, label } => {
                        Arc::new(LastPriceMarket::new(client.clone(), url, label))
                    }
                }
            })
            .collect();
        Self::new(markets)
    }

    #[instrument(name = "ReferenceRateResolve", skip(self))]
    pub async fn resolve(&self) -> Option<f64> {
        for market in &self.markets {
            match market.btc_rate().await {
                Ok(rate) if !(rate.is_finite() && rate > 0.0) => {
                    warn!(market = market.name(), rate, "Reference market returned non-positive rate");
                }
                Ok(rate) => {
                    debug!(market = market.name(), rate, "Resolved reference rate");
                    return Some(rate);
                }
                Err(e) => warn!(market = market.name(), error = %e, "Reference market failed"),
            }
        }
        warn!("No reference market produced a rate");
        None
    }
}
