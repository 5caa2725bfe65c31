//! IPFS gateway client.

use super::ContentFetcher;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors that can occur while fetching content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request error (connect, timeout, body read)
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Gateway answered with a non-success status
    #[error("gateway returned status {status} for {cid}")]
    Status { cid: String, status: u16 },

    /// Gateway answered with an empty body
    #[error("gateway returned no data for {0}")]
    Empty(String),

    /// The identifier cannot be used in a gateway path
    #[error("invalid content id: {0:?}")]
    InvalidContentId(String),
}

/// Fetches content through a path-style IPFS gateway (`<gateway>/ipfs/<cid>`).
///
/// No retries and no caching: every call is exactly one GET.
pub struct IpfsGatewayFetcher {
    gateway: Url,
    http_client: reqwest::Client,
}

impl IpfsGatewayFetcher {
    /// Create a new fetcher.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Base URL of the gateway, e.g. `https://ipfs.io/`
    /// * `timeout` - Per-request timeout
    pub fn new(mut gateway: Url, timeout: Duration) -> Self {
        if !gateway.path().ends_with('/') {
            let path = format!("{}/", gateway.path());
            gateway.set_path(&path);
        }
        Self {
            gateway,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Gateway URL for `cid`.
    pub fn content_url(&self, cid: &str) -> Result<Url, FetchError> {
        if cid.is_empty() || cid.contains(['/', '?', '#']) || cid.contains(char::is_whitespace) {
            return Err(FetchError::InvalidContentId(cid.to_string()));
        }
        self.gateway
            .join(&format!("ipfs/{cid}"))
            .map_err(|_| FetchError::InvalidContentId(cid.to_string()))
    }
}

#[async_trait]
impl ContentFetcher for IpfsGatewayFetcher {
    async fn fetch(&self, cid: &str) -> Result<Bytes, FetchError> {
        let url = self.content_url(cid)?;
        debug!(cid = cid, url = %url, "Fetching content");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                cid: cid.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::Empty(cid.to_string()));
        }
        Ok(body)
    }
}
