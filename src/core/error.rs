//! Error types shared across the rate engine

use thiserror::Error;

/// Failure of a single upstream request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("http status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl FetchError {
    pub fn parse(url: &str, reason: impl Into<String>) -> Self {
        FetchError::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure converting an upstream quote into a fixed-point fiat amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("invalid decimal value: {0}")]
    InvalidDecimal(String),

    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    #[error("non-positive amount {amount} for {code}")]
    NonPositive { code: String, amount: String },
}

/// Operations the rate provider refuses to perform.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
