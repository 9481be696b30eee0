use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::debug;

use super::rate::{ExchangeRate, RateTable};

/// Default time after which cached rates are refreshed.
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Holds the latest published rate table and when it was fetched.
///
/// Tables are immutable once published; `replace` swaps the whole table so a
/// reader sees either the previous or the new one.
pub struct RateCache {
    table: RwLock<Option<Arc<RateTable>>>,
    last_updated: AtomicI64,
    interval_ms: i64,
}

impl RateCache {
    pub fn new() -> Self {
        Self::with_interval(UPDATE_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            table: RwLock::new(None),
            last_updated: AtomicI64::new(0),
            interval_ms: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Publishes a single-entry table without marking the cache fresh.
    pub fn seed(&self, rate: ExchangeRate) {
        let mut table = RateTable::new();
        table.insert(rate.currency_code.clone(), rate);
        debug!(entries = 1, "Cache SEED");
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(table));
    }

    /// Publishes `table` and stamps it as fetched at `now_ms`.
    pub fn replace(&self, table: RateTable, now_ms: i64) {
        let entries = table.len();
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(table));
        self.last_updated.store(now_ms, Ordering::Release);
        debug!(entries, "Cache REPLACE");
    }

    /// True when never refreshed or the last refresh is older than the interval.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        let last = self.last_updated();
        last == 0 || now_ms.saturating_sub(last) > self.interval_ms
    }

    pub fn last_updated(&self) -> i64 {
        self.last_updated.load(Ordering::Acquire)
    }

    /// Current table, or `None` before the first seed or refresh.
    pub fn snapshot(&self) -> Option<Arc<RateTable>> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}
