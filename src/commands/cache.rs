//! Offline cache command implementation.

use crate::config::Config;
use crate::offline::{
    AssetFetcher, AssetRequest, CacheStorage, HttpFetcher, OfflineWorker, ResponseSource,
};
use anyhow::{Context, Result};
use tracing::info;

/// Installs, inspects and serves from the offline asset cache.
pub struct CacheCommand<F: AssetFetcher> {
    config: Config,
    worker: OfflineWorker<F>,
}

impl CacheCommand<HttpFetcher> {
    /// Creates a cache command backed by the network.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: AssetFetcher> CacheCommand<F> {
    /// Creates a cache command with a custom fetcher (for testing).
    pub fn with_fetcher(config: Config, fetcher: F) -> Result<Self> {
        let storage = CacheStorage::new(config.cache_dir());
        let worker = OfflineWorker::new(storage, fetcher, &config.offline)
            .context("Invalid offline configuration")?;
        Ok(Self { config, worker })
    }

    /// Pre-caches the static assets and evicts older versions.
    pub async fn install(&mut self) -> Result<String> {
        self.worker.install().await.context("Install failed")?;
        let deleted = self.worker.activate()?;

        let mut lines = vec![format!(
            "Installed {} ({} assets)",
            self.worker.version(),
            self.config.offline.assets.len()
        )];
        if !deleted.is_empty() {
            lines.push(format!("Evicted: {}", deleted.join(", ")));
        }
        Ok(lines.join("\n"))
    }

    /// Fetches a URL through the worker and reports where the response came from.
    pub async fn fetch(&mut self, method: &str, url: &str) -> Result<String> {
        let request = AssetRequest::parse(method, url)?;
        if !self.worker.resume() {
            info!("Cache {} not installed, fetching directly", self.worker.version());
        }

        let (response, source) = self.worker.fetch(&request).await?;
        let source = match source {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
        };

        Ok(format!(
            "{} {} -> {} ({}, {} bytes)\n\n{}",
            request.method(),
            request.url(),
            response.status,
            source,
            response.body.len(),
            response.text()
        ))
    }

    /// Lists cache containers with their entry counts.
    pub fn list(&self) -> Result<String> {
        let storage = self.worker.storage();
        let names = storage.keys()?;
        if names.is_empty() {
            return Ok("No caches installed.".to_string());
        }

        let mut lines = Vec::new();
        for name in names {
            let cache = storage.open(&name)?;
            let marker = if name == self.worker.version() { "*" } else { " " };
            lines.push(format!("{} {:<24} {} entries", marker, name, cache.len()));
        }
        Ok(lines.join("\n"))
    }
}
