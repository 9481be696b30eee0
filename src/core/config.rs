use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use super::rate::EXCLUDED_CODES;
use super::selector::DEFAULT_EXCHANGE_CURRENCY;

/// JSON layout of a rate feed response.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedShape {
    /// `{ "USD": { "last": .. }, "timestamp": .. }`
    Object,
    /// `[ { "code": "USD", "rate": .. } ]`
    Array,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedConfig {
    /// Label attached to every rate from this feed.
    pub name: String,
    pub url: String,
    pub shape: FeedShape,
    /// Fields tried in order for each currency.
    pub fields: Vec<String>,
}

/// Upstream market quoting the reference coin in BTC.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketConfig {
    /// `{ "ticker": { "buy": .. } }`
    TickerBuy { url: String },
    /// `{ "Success": true, "Data": { "Label": .., "LastPrice": .. } }`
    LastPrice { url: String, label: String },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReferenceConfig {
    pub markets: Vec<MarketConfig>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig {
            markets: vec![
                MarketConfig::TickerBuy {
                    url: "https://c-cex.com/t/gld-btc.json".to_string(),
                },
                MarketConfig::LastPrice {
                    url: "https://www.cryptopia.co.nz/api/GetMarket/2623".to_string(),
                    label: "GLD/BTC".to_string(),
                },
            ],
        }
    }
}

pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "bitpay.com".to_string(),
            url: "https://bitpay.com/api/rates".to_string(),
            shape: FeedShape::Array,
            fields: vec!["rate".to_string()],
        },
        FeedConfig {
            name: "BitcoinAverage.com".to_string(),
            url: "https://api.bitcoinaverage.com/custom/abw".to_string(),
            shape: FeedShape::Object,
            fields: vec!["24h_avg".to_string(), "last".to_string()],
        },
        FeedConfig {
            name: "blockchain.info".to_string(),
            url: "https://blockchain.info/ticker".to_string(),
            shape: FeedShape::Object,
            fields: vec!["15m".to_string()],
        },
    ]
}

fn default_user_agent() -> String {
    format!("coinrates/{}", env!("CARGO_PKG_VERSION"))
}

fn default_fallback_currency() -> String {
    DEFAULT_EXCHANGE_CURRENCY.to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_update_interval_secs() -> u64 {
    600
}

fn default_excluded_codes() -> Vec<String> {
    EXCLUDED_CODES.iter().map(|c| c.to_string()).collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Currency whose rate is persisted across restarts.
    #[serde(default)]
    pub exchange_currency: Option<String>,
    #[serde(default = "default_fallback_currency")]
    pub fallback_currency: String,
    /// Overrides the environment locale, e.g. `de_DE`.
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    #[serde(default = "default_excluded_codes")]
    pub excluded_codes: Vec<String>,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
    #[serde(default)]
    pub reference: ReferenceConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            user_agent: default_user_agent(),
            exchange_currency: None,
            fallback_currency: default_fallback_currency(),
            locale: None,
            http_timeout_secs: default_http_timeout_secs(),
            update_interval_secs: default_update_interval_secs(),
            excluded_codes: default_excluded_codes(),
            feeds: default_feeds(),
            reference: ReferenceConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "coinrates", "coinrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "coinrates", "coinrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        // An empty document deserializes to unit, not a mapping
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
