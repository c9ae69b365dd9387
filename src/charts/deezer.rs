use std::time::Duration;

use async_trait::async_trait;

use crate::charts::{ChartPayload, ChartSource, UpstreamError};

/// HTTP client for the Deezer chart endpoint.
#[derive(Debug, Clone)]
pub struct DeezerClient {
    http: reqwest::Client,
    url: String,
}

impl DeezerClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ChartSource for DeezerClient {
    async fn fetch_chart(&self) -> Result<ChartPayload, UpstreamError> {
        tracing::debug!("Fetching chart from {}", self.url);
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(serde_json::from_slice(&body)?)
    }
}
