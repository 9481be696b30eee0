use anyhow::Result;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use super::RateStore;
use crate::core::ExchangeRate;

/// In-memory store, lost when the process exits.
#[derive(Default)]
pub struct MemoryRateStore {
    inner: Mutex<Option<ExchangeRate>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(rate: ExchangeRate) -> Self {
        Self {
            inner: Mutex::new(Some(rate)),
        }
    }
}

impl RateStore for MemoryRateStore {
    fn load(&self) -> Result<Option<ExchangeRate>> {
        let stored = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        debug!(hit = stored.is_some(), "Store LOAD");
        Ok(stored)
    }

    fn save(&self, rate: &ExchangeRate) -> Result<()> {
        debug!(currency = %rate.currency_code, "Store SAVE");
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(rate.clone());
        Ok(())
    }
}
