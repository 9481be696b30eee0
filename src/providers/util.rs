use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::FetchError;

/// Builds the HTTP client shared by all upstreams.
///
/// Redirects are not followed and gzip responses are decoded transparently.
/// `timeout` bounds connecting and each read, not the whole transfer.
pub fn http_client(user_agent: &str, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .gzip(true)
        .build()
}

/// Response body parsed as JSON, with its length in characters.
#[derive(Debug)]
pub struct JsonBody {
    pub value: Value,
    pub chars: usize,
}

/// Issues a single GET and parses the body. Anything but 200 is an error.
pub async fn get_json(client: &Client, url: &str) -> Result<JsonBody, FetchError> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

    let value = serde_json::from_str(&text)
        .map_err(|e| FetchError::parse(url, format!("invalid JSON: {e}")))?;

    Ok(JsonBody {
        value,
        chars: text.chars().count(),
    })
}

/// Reads a JSON number or numeric string.
pub fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a scalar as text, the way upstream quotes are handed to conversion.
pub fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
