pub mod cli;
pub mod core;
pub mod engine;
pub mod providers;
pub mod store;

pub use crate::core::config;

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::RateSelector;
use crate::core::currency::default_currency_code;
use crate::engine::{QueryEngine, QueryFilter, QueryRequest};
use crate::store::DiskRateStore;

pub enum AppCommand {
    List,
    Search(String),
    Rate(Option<String>),
}

impl AppCommand {
    fn filter(self) -> QueryFilter {
        match self {
            AppCommand::List => QueryFilter::All,
            AppCommand::Search(query) => QueryFilter::Search(query),
            AppCommand::Rate(code) => QueryFilter::Code(code.map(|c| c.to_uppercase())),
        }
    }
}

pub fn load_config(config_path: Option<&str>) -> Result<config::AppConfig> {
    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Wires feeds, the on-disk store and currency defaults from `config`.
pub fn build_engine(config: &config::AppConfig) -> Result<QueryEngine> {
    let feed = Arc::new(providers::build_feed_chain(config)?);
    let store_path = config.data_path()?.join("store");
    let store = Arc::new(
        DiskRateStore::open(&store_path)
            .with_context(|| format!("Failed to open store at {}", store_path.display()))?,
    );

    let locale_currency = default_currency_code(config.locale.as_deref());
    debug!(locale_currency = ?locale_currency, "Resolved locale currency");
    let selector = RateSelector::new(locale_currency, &config.fallback_currency);

    Ok(QueryEngine::new(
        feed,
        store,
        selector,
        config.exchange_currency.clone(),
        config.update_interval(),
    ))
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    offline: bool,
) -> Result<()> {
    info!("coinrates starting...");
    let config = load_config(config_path)?;
    let engine = build_engine(&config)?;
    let request = QueryRequest::new(command.filter()).offline(offline);

    cli::rates::run(&engine, &request, Utc::now().timestamp_millis()).await
}
