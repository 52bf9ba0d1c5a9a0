//! Network side of the offline cache.

use super::request::{AssetRequest, AssetResponse};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// Trait for network fetches - enables mocking for tests.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Performs the request. Non-2xx statuses are returned, not raised.
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse>;
}

/// Fetches assets over HTTP the way a browser would.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        Ok(Self { client: builder.build()? })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
        let url = request.url().as_str();
        debug!("{} {}", request.method(), url);

        let builder = match request.method() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "PATCH" => self.client.patch(url),
            "DELETE" => self.client.delete(url),
            "HEAD" => self.client.head(url),
            other => anyhow::bail!("Unsupported method: {}", other),
        };

        let response = builder
            .emulation(Emulation::Chrome131)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!("Response status: {}", status);

        let body = response.bytes().await.context("Failed to read response body")?;
        Ok(AssetResponse::new(status, content_type, body.to_vec()))
    }
}
