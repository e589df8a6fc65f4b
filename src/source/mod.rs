pub mod errors;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use self::{
    errors::{Endpoint, SourceError},
    models::Reading,
};

pub type Result<T> = std::result::Result<T, SourceError>;

/// Read-only access to the station's stored readings.
///
/// Implementations make exactly one attempt per call; retrying is the caller's
/// periodic refresh.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Latest reading for the device, `None` if the device has never reported.
    async fn fetch_latest(&self, device_id: &str) -> Result<Option<Reading>>;

    /// Readings of the last `lookback_hours`, oldest first. Empty when there is
    /// no data in range.
    async fn fetch_history(&self, device_id: &str, lookback_hours: u32) -> Result<Vec<Reading>>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, http: Client) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        let parsed = Url::parse(&base_url).map_err(|e| SourceError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SourceError::InvalidUrl {
                url: base_url,
                reason: "scheme must be http or https".to_owned(),
            });
        }

        Ok(Self {
            inner: Arc::new(Inner { http, base_url }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/api/{endpoint}", self.inner.base_url);
        let mut url = Url::parse(&raw).map_err(|e| SourceError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint, url: Url) -> Result<T> {
        debug!(endpoint = %endpoint, url = %url, "Requesting readings");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| SourceError::Transport { endpoint, source })?;

        serde_json::from_slice::<T>(&bytes).map_err(|source| SourceError::Malformed { endpoint, source })
    }
}

#[async_trait]
impl ReadingSource for ApiClient {
    async fn fetch_latest(&self, device_id: &str) -> Result<Option<Reading>> {
        let url = self.url(Endpoint::Latest, &[("device_id", device_id)])?;
        self.get_json(Endpoint::Latest, url).await
    }

    async fn fetch_history(&self, device_id: &str, lookback_hours: u32) -> Result<Vec<Reading>> {
        let hours = lookback_hours.to_string();
        let url = self.url(
            Endpoint::History,
            &[("device_id", device_id), ("hours", hours.as_str())],
        )?;
        self.get_json(Endpoint::History, url).await
    }
}
