use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::feed::RateFeed;
use crate::core::RateTable;

/// Tries feeds in priority order and returns the first table fetched.
pub struct FeedChain {
    feeds: Vec<Arc<dyn RateFeed>>,
}

impl FeedChain {
    pub fn new(feeds: Vec<Arc<dyn RateFeed>>) -> Self {
        Self { feeds }
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

#[async_trait]
impl RateFeed for FeedChain {
    async fn fetch(&self) -> Option<RateTable> {
        for feed in &self.feeds {
            if let Some(rates) = feed.fetch().await {
                debug!(feed = feed.name(), entries = rates.len(), "Feed chain resolved");
                return Some(rates);
            }
            debug!(feed = feed.name(), "Feed failed, trying next");
        }
        warn!("All rate feeds failed");
        None
    }

    fn name(&self) -> &str {
        "chain"
    }
}
