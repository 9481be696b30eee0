//! Durable storage for the single rate kept across restarts.

pub mod disk;
pub mod memory;

pub use disk::DiskRateStore;
pub use memory::MemoryRateStore;

use anyhow::Result;

use crate::core::ExchangeRate;

/// Stores one exchange rate as scalar fields.
pub trait RateStore: Send + Sync {
    /// The stored rate, or `None` when nothing complete was stored.
    fn load(&self) -> Result<Option<ExchangeRate>>;

    /// Replaces the stored rate.
    fn save(&self, rate: &ExchangeRate) -> Result<()>;
}
