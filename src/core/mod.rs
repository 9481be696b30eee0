//! Rate engine domain logic and abstractions

pub mod amount;
pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod rate;
pub mod selector;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use error::{ConversionError, FetchError, ProviderError};
pub use rate::{ExchangeRate, RateTable};
pub use selector::RateSelector;
