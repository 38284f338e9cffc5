//! Transport to the backend
//!
//! The adapter talks to the backend through [`Transport`], which returns the
//! raw JSON body of a successful (2xx) response. [`HttpTransport`] is the
//! `reqwest` implementation; tests substitute their own.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::data::Envelope;
use crate::error::{AdapterError, Result};

/// Backend paths
pub mod endpoints {
    use crate::data::CloudType;

    pub const SEARCH: &str = "/api/search";
    pub const DOUBAN_HOT: &str = "/api/douban/hot";
    pub const SPONSORS: &str = "/api/sponsors";
    pub const HEALTH: &str = "/api/health";

    pub fn share_info(cloud: CloudType) -> String {
        format!("/api/{}/share-info", cloud)
    }

    pub fn folders(cloud: CloudType) -> String {
        format!("/api/{}/folders", cloud)
    }

    pub fn save(cloud: CloudType) -> String {
        format!("/api/{}/save", cloud)
    }
}

pub type Query = Vec<(String, String)>;

/// Issues requests against the backend
///
/// Implementations return `RemoteUnavailable` for network failures and
/// non-2xx statuses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &Query) -> Result<Value>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value>;
}

/// `reqwest`-backed transport rooted at a base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: trim_base(base_url.into()),
        }
    }

    /// Applies `timeout` to every request made through this transport
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: trim_base(base_url.into()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_body(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::RemoteUnavailable(format!("HTTP {}", status)));
        }
        Ok(response.json::<Value>().await?)
    }
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(%url, ?query, "GET");
        let response = self.http_client.get(&url).query(query).send().await?;
        Self::read_body(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self.http_client.post(&url).json(body).send().await?;
        Self::read_body(response).await
    }
}

/// Flattens a serializable struct into query pairs, skipping nulls
pub fn query_pairs<T: Serialize>(params: &T) -> Result<Query> {
    let value = serde_json::to_value(params)?;
    let Value::Object(map) = value else {
        return Ok(Vec::new());
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => pairs.push((key, s)),
            other => pairs.push((key, other.to_string())),
        }
    }
    Ok(pairs)
}

/// Decodes a backend body into a typed envelope
///
/// A body that is not an envelope of `T` counts as the backend being
/// unavailable.
pub fn decode_envelope<T: DeserializeOwned>(body: Value) -> Result<Envelope<T>> {
    serde_json::from_value(body)
        .map_err(|e| AdapterError::RemoteUnavailable(format!("malformed response: {}", e)))
}
