//! Query orchestration: refresh when stale, then answer from the cache.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::core::currency::currency_symbol;
use crate::core::{ExchangeRate, ProviderError, RateCache, RateSelector};
use crate::providers::RateFeed;
use crate::store::RateStore;

/// Stable row identifier derived from a currency code.
pub fn row_id(code: &str) -> i32 {
    code.encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// One result row of a rate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRow {
    pub id: i32,
    pub currency_code: String,
    pub rate_coin: i64,
    pub rate_fiat: i64,
    pub source: String,
}

impl RateRow {
    pub fn to_exchange_rate(&self) -> ExchangeRate {
        ExchangeRate {
            currency_code: self.currency_code.clone(),
            coin_amount: self.rate_coin,
            fiat_amount: self.rate_fiat,
            source: self.source.clone(),
        }
    }
}

impl From<&ExchangeRate> for RateRow {
    fn from(rate: &ExchangeRate) -> Self {
        RateRow {
            id: row_id(&rate.currency_code),
            currency_code: rate.currency_code.clone(),
            rate_coin: rate.coin_amount,
            rate_fiat: rate.fiat_amount,
            source: rate.source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Every cached rate, ordered by code.
    All,
    /// Case-insensitive match on currency code or display symbol.
    Search(String),
    /// Best rate for a code, falling back to the locale and default currencies.
    Code(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Never touch the network, answer from whatever is cached.
    pub offline: bool,
    pub filter: QueryFilter,
}

impl QueryRequest {
    pub fn new(filter: QueryFilter) -> Self {
        Self {
            offline: false,
            filter,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

pub struct QueryEngine {
    feed: Arc<dyn RateFeed>,
    store: Arc<dyn RateStore>,
    cache: RateCache,
    selector: RateSelector,
    exchange_currency: Option<String>,
    refresh_gate: Mutex<()>,
}

impl QueryEngine {
    /// Creates an engine, seeding the cache with the stored rate if there is one.
    pub fn new(
        feed: Arc<dyn RateFeed>,
        store: Arc<dyn RateStore>,
        selector: RateSelector,
        exchange_currency: Option<String>,
        update_interval: Duration,
    ) -> Self {
        let cache = RateCache::with_interval(update_interval);
        match store.load() {
            Ok(Some(rate)) => {
                info!(currency = %rate.currency_code, source = %rate.source, "Seeding cache with stored rate");
                cache.seed(rate);
            }
            Ok(None) => debug!("No stored rate"),
            Err(e) => warn!(error = %e, "Failed to load stored rate"),
        }

        Self {
            feed,
            store,
            cache,
            selector,
            exchange_currency,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Fetches and publishes a new table if the cache is stale.
    ///
    /// Returns true when a new table was published. Concurrent callers wait
    /// for an in-flight refresh instead of starting their own.
    pub async fn refresh(&self, now_ms: i64) -> bool {
        let _guard = self.refresh_gate.lock().await;
        if !self.cache.is_stale(now_ms) {
            debug!("Cache already fresh");
            return false;
        }

        let Some(table) = self.feed.fetch().await else {
            return false;
        };
        self.cache.replace(table, now_ms);
        self.persist_best_rate();
        true
    }

    fn persist_best_rate(&self) {
        let Some(table) = self.cache.snapshot() else {
            return;
        };
        let Some(rate) = self
            .selector
            .select(&table, self.exchange_currency.as_deref())
        else {
            debug!("No rate to persist");
            return;
        };
        if let Err(e) = self.store.save(rate) {
            warn!(currency = %rate.currency_code, error = %e, "Failed to persist rate");
        }
    }

    /// Answers a query, refreshing first unless offline or fresh.
    ///
    /// Returns `None` when no table has ever been available.
    pub async fn query(&self, now_ms: i64, request: &QueryRequest) -> Option<Vec<RateRow>> {
        if !request.offline && self.cache.is_stale(now_ms) {
            self.refresh(now_ms).await;
        }

        let table = self.cache.snapshot()?;
        let rows = match &request.filter {
            QueryFilter::All => table.values().map(RateRow::from).collect(),
            QueryFilter::Search(query) => {
                let query = query.to_lowercase();
                table
                    .values()
                    .filter(|rate| {
                        let code = &rate.currency_code;
                        code.to_lowercase().contains(&query)
                            || currency_symbol(code).to_lowercase().contains(&query)
                    })
                    .map(RateRow::from)
                    .collect()
            }
            QueryFilter::Code(code) => self
                .selector
                .select(&table, code.as_deref())
                .map(RateRow::from)
                .into_iter()
                .collect(),
        };
        Some(rows)
    }

    pub fn insert(&self, _row: &RateRow) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported("insert"))
    }

    pub fn update(&self, _row: &RateRow) -> Result<usize, ProviderError> {
        Err(ProviderError::Unsupported("update"))
    }

    pub fn delete(&self, _filter: &QueryFilter) -> Result<usize, ProviderError> {
        Err(ProviderError::Unsupported("delete"))
    }

    pub fn content_type(&self) -> Result<String, ProviderError> {
        Err(ProviderError::Unsupported("content_type"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RateTable;
    use crate::core::cache::UPDATE_INTERVAL;
    use crate::store::MemoryRateStore;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NOW: i64 = 1_700_000_000_000;

    struct MockFeed {
        responses: StdMutex<Vec<Option<RateTable>>>,
        call_count: AtomicUsize,
        delay: Duration,
    }

    impl MockFeed {
        /// Returns the responses in order, repeating the last one.
        fn new(responses: Vec<Option<RateTable>>) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(responses),
                call_count: AtomicUsize::new(0),
                delay: Duration::ZERO,
            })
        }

        fn slow(responses: Vec<Option<RateTable>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(responses),
                call_count: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateFeed for MockFeed {
        async fn fetch(&self) -> Option<RateTable> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses.first().cloned().flatten()
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn table(source: &str, codes: &[&str]) -> RateTable {
        codes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                (
                    c.to_string(),
                    ExchangeRate::new(c, (i as i64 + 1) * 1_000_000, source),
                )
            })
            .collect()
    }

    fn engine(
        feed: Arc<MockFeed>,
        store: Arc<MemoryRateStore>,
        exchange_currency: Option<&str>,
    ) -> QueryEngine {
        QueryEngine::new(
            feed,
            store,
            RateSelector::new(None, "USD"),
            exchange_currency.map(str::to_string),
            UPDATE_INTERVAL,
        )
    }

    fn codes(rows: &[RateRow]) -> Vec<&str> {
        rows.iter().map(|r| r.currency_code.as_str()).collect()
    }

    #[test]
    fn test_row_id_is_stable_code_hash() {
        assert_eq!(row_id("USD"), 84326);
        assert_eq!(row_id("EUR"), 69026);
        assert_eq!(row_id(""), 0);
    }

    #[test]
    fn test_row_round_trip() {
        let rate = ExchangeRate::new("EUR", 3_000_000, "bitpay.com");
        let row = RateRow::from(&rate);
        assert_eq!(row.id, row_id("EUR"));
        assert_eq!(row.rate_coin, 100_000_000);
        assert_eq!(row.to_exchange_rate(), rate);
    }

    #[tokio::test]
    async fn test_enumerates_all_sorted() {
        let feed = MockFeed::new(vec![Some(table("feed", &["USD", "EUR", "GBP"]))]);
        let engine = engine(feed, Arc::new(MemoryRateStore::new()), None);

        let rows = engine
            .query(NOW, &QueryRequest::new(QueryFilter::All))
            .await
            .unwrap();
        assert_eq!(codes(&rows), vec!["EUR", "GBP", "USD"]);
        assert!(rows.iter().all(|r| r.rate_fiat > 0 && r.source == "feed"));
    }

    #[tokio::test]
    async fn test_refreshes_once_within_interval() {
        let feed = MockFeed::new(vec![Some(table("feed", &["USD"]))]);
        let engine = engine(feed.clone(), Arc::new(MemoryRateStore::new()), None);
        let request = QueryRequest::new(QueryFilter::All);

        engine.query(NOW, &request).await.unwrap();
        engine.query(NOW + 60_000, &request).await.unwrap();
        engine
            .query(NOW + UPDATE_INTERVAL.as_millis() as i64, &request)
            .await
            .unwrap();
        assert_eq!(feed.calls(), 1);

        engine
            .query(NOW + UPDATE_INTERVAL.as_millis() as i64 + 1, &request)
            .await
            .unwrap();
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_table_and_retries() {
        let feed = MockFeed::new(vec![
            Some(table("first", &["USD"])),
            None,
            Some(table("third", &["EUR", "USD"])),
        ]);
        let engine = engine(feed.clone(), Arc::new(MemoryRateStore::new()), None);
        let request = QueryRequest::new(QueryFilter::All);

        engine.query(NOW, &request).await.unwrap();
        let later = NOW + 3_600_000;
        let rows = engine.query(later, &request).await.unwrap();
        assert_eq!(rows[0].source, "first");
        assert_eq!(engine.cache().last_updated(), NOW);

        let rows = engine.query(later + 1, &request).await.unwrap();
        assert_eq!(codes(&rows), vec!["EUR", "USD"]);
        assert_eq!(engine.cache().last_updated(), later + 1);
        assert_eq!(feed.calls(), 3);
    }

    #[tokio::test]
    async fn test_offline_never_fetches() {
        let feed = MockFeed::new(vec![Some(table("feed", &["USD"]))]);
        let engine = engine(feed.clone(), Arc::new(MemoryRateStore::new()), None);

        let offline = QueryRequest::new(QueryFilter::Code(None)).offline(true);
        assert!(engine.query(NOW, &offline).await.is_none());
        assert_eq!(feed.calls(), 0);

        engine
            .query(NOW, &QueryRequest::new(QueryFilter::All))
            .await
            .unwrap();
        let rows = engine.query(NOW + 3_600_000, &offline).await.unwrap();
        assert_eq!(codes(&rows), vec!["USD"]);
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_data_returns_none() {
        let feed = MockFeed::new(vec![None]);
        let engine = engine(feed, Arc::new(MemoryRateStore::new()), None);
        assert!(
            engine
                .query(NOW, &QueryRequest::new(QueryFilter::All))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_seeded_from_store_on_cold_start() {
        let stored = ExchangeRate::new("EUR", 3_000_000, "bitpay.com");
        let store = Arc::new(MemoryRateStore::with_rate(stored.clone()));
        let feed = MockFeed::new(vec![None]);
        let engine = engine(feed, store, None);

        let rows = engine
            .query(NOW, &QueryRequest::new(QueryFilter::All))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].to_exchange_rate(), stored);

        // The seed alone never counts as fresh
        assert!(engine.cache().is_stale(NOW));
    }

    #[tokio::test]
    async fn test_persists_best_rate_for_exchange_currency() {
        let store = Arc::new(MemoryRateStore::new());
        let feed = MockFeed::new(vec![Some(table("feed", &["EUR", "GBP", "USD"]))]);
        let engine = engine(feed, store.clone(), Some("GBP"));

        engine
            .query(NOW, &QueryRequest::new(QueryFilter::All))
            .await
            .unwrap();
        assert_eq!(store.load().unwrap().unwrap().currency_code, "GBP");

        // A fresh process sees exactly the persisted entry
        let restarted = self::engine(MockFeed::new(vec![None]), store.clone(), Some("GBP"));
        let rows = restarted
            .query(NOW, &QueryRequest::new(QueryFilter::All).offline(true))
            .await
            .unwrap();
        assert_eq!(codes(&rows), vec!["GBP"]);
    }

    #[tokio::test]
    async fn test_persist_falls_back_and_skips_when_unresolvable() {
        let store = Arc::new(MemoryRateStore::new());
        let feed = MockFeed::new(vec![Some(table("feed", &["EUR", "USD"]))]);
        engine(feed, store.clone(), Some("JPY"))
            .query(NOW, &QueryRequest::new(QueryFilter::All))
            .await;
        assert_eq!(store.load().unwrap().unwrap().currency_code, "USD");

        let store = Arc::new(MemoryRateStore::new());
        let feed = MockFeed::new(vec![Some(table("feed", &["EUR"]))]);
        engine(feed, store.clone(), None)
            .query(NOW, &QueryRequest::new(QueryFilter::All))
            .await;
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_code_precedence() {
        let feed = MockFeed::new(vec![Some(table("feed", &["EUR", "GBP", "USD"]))]);
        let engine = QueryEngine::new(
            feed,
            Arc::new(MemoryRateStore::new()),
            RateSelector::new(Some("EUR".to_string()), "USD"),
            None,
            UPDATE_INTERVAL,
        );

        let query = |code: Option<&str>| {
            QueryRequest::new(QueryFilter::Code(code.map(str::to_string)))
        };
        let rows = engine.query(NOW, &query(Some("GBP"))).await.unwrap();
        assert_eq!(codes(&rows), vec!["GBP"]);
        let rows = engine.query(NOW, &query(Some("JPY"))).await.unwrap();
        assert_eq!(codes(&rows), vec!["EUR"]);
        let rows = engine.query(NOW, &query(None)).await.unwrap();
        assert_eq!(codes(&rows), vec!["EUR"]);
    }

    #[tokio::test]
    async fn test_single_code_without_match_is_empty() {
        let feed = MockFeed::new(vec![Some(table("feed", &["GBP"]))]);
        let engine = engine(feed, Arc::new(MemoryRateStore::new()), None);
        let rows = engine
            .query(NOW, &QueryRequest::new(QueryFilter::Code(Some("JPY".to_string()))))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_code_and_symbol() {
        let feed = MockFeed::new(vec![Some(table(
            "feed",
            &["CAD", "EUR", "NOK", "SEK", "USD"],
        ))]);
        let engine = engine(feed, Arc::new(MemoryRateStore::new()), None);
        let search = |q: &str| QueryRequest::new(QueryFilter::Search(q.to_string()));

        let rows = engine.query(NOW, &search("eu")).await.unwrap();
        assert_eq!(codes(&rows), vec!["EUR"]);

        let rows = engine.query(NOW, &search("€")).await.unwrap();
        assert_eq!(codes(&rows), vec!["EUR"]);

        let rows = engine.query(NOW, &search("KR")).await.unwrap();
        assert_eq!(codes(&rows), vec!["NOK", "SEK"]);

        let rows = engine.query(NOW, &search("$")).await.unwrap();
        assert_eq!(codes(&rows), vec!["CAD", "USD"]);

        let rows = engine.query(NOW, &search("xyz")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_stale_queries_fetch_once() {
        let feed = MockFeed::slow(
            vec![Some(table("feed", &["USD"]))],
            Duration::from_millis(50),
        );
        let engine = engine(feed.clone(), Arc::new(MemoryRateStore::new()), None);
        let request = QueryRequest::new(QueryFilter::All);

        let (a, b) = tokio::join!(engine.query(NOW, &request), engine.query(NOW, &request));
        assert_eq!(codes(&a.unwrap()), vec!["USD"]);
        assert_eq!(codes(&b.unwrap()), vec!["USD"]);
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn test_write_operations_are_unsupported() {
        let engine = engine(MockFeed::new(vec![None]), Arc::new(MemoryRateStore::new()), None);
        let row = RateRow::from(&ExchangeRate::new("EUR", 1, "x"));

        assert_eq!(engine.insert(&row), Err(ProviderError::Unsupported("insert")));
        assert_eq!(engine.update(&row), Err(ProviderError::Unsupported("update")));
        assert_eq!(
            engine.delete(&QueryFilter::All),
            Err(ProviderError::Unsupported("delete"))
        );
        assert_eq!(
            engine.content_type(),
            Err(ProviderError::Unsupported("content_type"))
        );
    }
}
