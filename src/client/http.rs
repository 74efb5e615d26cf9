//! HTTP implementation of the resource client

use super::{FeedEnvelope, Page, ResourceClient};
use crate::config::FeederConfig;
use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

/// Request/response header carrying the sticky-session affinity token
pub const AFFINITY_HEADER: &str = "x-feed-affinity";

/// Header carrying the access key
pub const ACCESS_KEY_HEADER: &str = "x-access-key";

/// Reqwest-backed resource client for the feed endpoint
pub struct HttpResourceClient {
    client: Client,
    feed_url: String,
    access_key: String,
}

impl HttpResourceClient {
    /// Build a client from the feeder config
    pub fn new(config: &FeederConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("feedsync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        let base = config.base_url.trim_end_matches('/');
        let feed_url = format!("{}{}", base, config.feed_path());
        // Validate eagerly so a bad base URL fails at construction.
        url::Url::parse(&feed_url)?;

        Ok(Self {
            client,
            feed_url,
            access_key: config.access_key.clone(),
        })
    }

    async fn classify_failure(response: Response) -> Error {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body = response.text().await.unwrap_or_default();
        Error::from_status(status, body, retry_after)
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn fetch_page(&self, params: &StringMap, affinity: Option<&str>) -> Result<Page> {
        let mut req = self
            .client
            .get(&self.feed_url)
            .query(params)
            .header(ACCESS_KEY_HEADER, self.access_key.as_str());
        if let Some(token) = affinity {
            req = req.header(AFFINITY_HEADER, token);
        }

        let response = req.send().await.map_err(Error::Http)?;
        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let observed = response
            .headers()
            .get(AFFINITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let envelope: FeedEnvelope = response.json().await.map_err(Error::Http)?;
        debug!(
            items = envelope.items.len(),
            status = envelope.status,
            "fetched feed page"
        );
        Ok(envelope.into_page(observed))
    }
}

impl std::fmt::Debug for HttpResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResourceClient")
            .field("feed_url", &self.feed_url)
            .finish_non_exhaustive()
    }
}
