pub mod chain;
pub mod feed;
pub mod reference;
pub mod util;

pub use chain::FeedChain;
pub use feed::{FeedSource, RateFeed};
pub use reference::{ReferenceRate, ReferenceRateResolver};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::config::AppConfig;

/// Builds the configured feeds, each converting through the configured markets.
pub fn build_feed_chain(config: &AppConfig) -> Result<FeedChain> {
    let client = util::http_client(&config.user_agent, config.http_timeout())
        .context("Failed to build HTTP client")?;
    let reference = Arc::new(ReferenceRateResolver::from_config(
        &client,
        &config.reference,
    ));

    let feeds = config
        .feeds
        .iter()
        .map(|feed| -> Arc<dyn RateFeed> {
            Arc::new(FeedSource::new(
                client.clone(),
                feed.clone(),
                config.excluded_codes.clone(),
                Arc::clone(&reference),
            ))
        })
        .collect();
    let chain = FeedChain::new(feeds);
    if chain.is_empty() {
        warn!("No rate feeds configured, queries will only see stored rates");
    } else {
        debug!(feeds = chain.len(), "Built feed chain");
    }
    Ok(chain)
}
