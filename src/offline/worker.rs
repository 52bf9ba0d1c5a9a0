//! Offline asset worker: `Install -> Activate -> Fetch-intercept`.
//!
//! The worker owns exactly one container at a time, named by the version
//! string. Activation evicts every other container so assets from an older
//! version are never served once a newer worker takes over.

use super::error::CacheError;
use super::fetcher::AssetFetcher;
use super::request::{AssetRequest, AssetResponse};
use super::storage::CacheStorage;
use crate::config::OfflineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use url::Url;

/// URL fragments whose cross-origin responses are written through to the cache.
const WRITE_THROUGH_PATTERNS: [&str; 2] = ["cdn", "fonts"];

/// How intercepted GET requests are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Same-origin requests go straight to the network; cross-origin requests
    /// are cache-first with write-through for CDN and font URLs.
    #[default]
    SameOriginBypass,
    /// Every request tries the network first and falls back to the cache.
    NetworkFirst,
}

impl FromStr for CachePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "same-origin-bypass" | "bypass" => Ok(CachePolicy::SameOriginBypass),
            "network-first" => Ok(CachePolicy::NetworkFirst),
            _ => Err(format!("Unknown cache policy: {}. Use: same-origin-bypass, network-first", s)),
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::SameOriginBypass => write!(f, "same-origin-bypass"),
            CachePolicy::NetworkFirst => write!(f, "network-first"),
        }
    }
}

/// Lifecycle position of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Not installed; fetches are not intercepted
    Parked,
    Installed,
    /// Controlling fetches
    Activated,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the caller performs a normal network fetch
    Passthrough,
    Responded { response: AssetResponse, source: ResponseSource },
}

/// Versioned offline cache worker.
pub struct OfflineWorker<F: AssetFetcher> {
    storage: CacheStorage,
    fetcher: F,
    version: String,
    origin: Url,
    assets: Vec<String>,
    policy: CachePolicy,
    state: WorkerState,
}

impl<F: AssetFetcher> OfflineWorker<F> {
    pub fn new(storage: CacheStorage, fetcher: F, settings: &OfflineConfig) -> Result<Self, CacheError> {
        let origin = Url::parse(&settings.origin)
            .map_err(|e| CacheError::InvalidUrl(format!("{}: {}", settings.origin, e)))?;

        Ok(Self {
            storage,
            fetcher,
            version: settings.cache_version.clone(),
            origin,
            assets: settings.assets.clone(),
            policy: settings.policy,
            state: WorkerState::Parked,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Static asset list resolved against the origin.
    pub fn static_requests(&self) -> Result<Vec<AssetRequest>, CacheError> {
        self.assets
            .iter()
            .map(|asset| {
                self.origin
                    .join(asset)
                    .map(AssetRequest::get)
                    .map_err(|e| CacheError::InvalidUrl(format!("{}: {}", asset, e)))
            })
            .collect()
    }

    /// Populates the current version's container with every static asset.
    ///
    /// Any failed asset fails the install and leaves the worker parked.
    pub async fn install(&mut self) -> Result<(), CacheError> {
        let requests = self.static_requests()?;
        info!("Installing {} ({} assets)", self.version, requests.len());

        let existed = self.storage.has(&self.version);
        let mut cache = match self.storage.open(&self.version) {
            Err(CacheError::Corrupt { reason, .. }) => {
                warn!("Rebuilding corrupt cache {}: {}", self.version, reason);
                self.storage.delete(&self.version)?;
                self.storage.open(&self.version)?
            }
            other => other?,
        };
        if let Err(e) = cache.replace_all(&self.fetcher, &requests).await {
            if !existed {
                self.storage.delete(&self.version)?;
            }
            return Err(e);
        }

        self.state = WorkerState::Installed;
        Ok(())
    }

    /// Evicts every other version and takes control immediately.
    ///
    /// Returns the names of deleted containers.
    pub fn activate(&mut self) -> Result<Vec<String>, CacheError> {
        if self.state == WorkerState::Parked {
            return Err(CacheError::NotInstalled);
        }

        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name != self.version && self.storage.delete(&name)? {
                deleted.push(name);
            }
        }

        if !deleted.is_empty() {
            info!("Evicted stale caches: {}", deleted.join(", "));
        }
        self.state = WorkerState::Activated;
        Ok(deleted)
    }

    /// Resumes control if the current version was installed by an earlier run.
    pub fn resume(&mut self) -> bool {
        if self.storage.has(&self.version) {
            debug!("Resuming worker {}", self.version);
            self.state = WorkerState::Activated;
            true
        } else {
            false
        }
    }

    /// Offers a request to the worker.
    pub async fn handle_fetch(&self, request: &AssetRequest) -> Result<FetchOutcome, CacheError> {
        if !request.is_get() || self.state != WorkerState::Activated {
            return Ok(FetchOutcome::Passthrough);
        }

        match self.policy {
            CachePolicy::SameOriginBypass => self.cache_first(request).await,
            CachePolicy::NetworkFirst => self.network_first(request).await,
        }
    }

    /// Offers a request and performs passthrough fetches on the network.
    pub async fn fetch(&self, request: &AssetRequest) -> Result<(AssetResponse, ResponseSource), CacheError> {
        match self.handle_fetch(request).await? {
            FetchOutcome::Responded { response, source } => Ok((response, source)),
            FetchOutcome::Passthrough => {
                let response = self
                    .fetcher
                    .fetch(request)
                    .await
                    .map_err(|e| CacheError::fetch(request.url(), &e))?;
                Ok((response, ResponseSource::Network))
            }
        }
    }

    async fn cache_first(&self, request: &AssetRequest) -> Result<FetchOutcome, CacheError> {
        if request.is_same_origin(&self.origin) {
            return Ok(FetchOutcome::Passthrough);
        }

        if let Some(response) = self.cached(request) {
            debug!("Cache hit: {}", request.url());
            return Ok(FetchOutcome::Responded { response, source: ResponseSource::Cache });
        }

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|e| CacheError::fetch(request.url(), &e))?;

        if response.status == 200 && is_write_through(request.url()) {
            // A failed write must not fail the fetch.
            let written = self
                .storage
                .open(&self.version)
                .and_then(|mut cache| cache.put(request, &response));
            if let Err(e) = written {
                warn!("Failed to cache {}: {}", request.url(), e);
            }
        }

        Ok(FetchOutcome::Responded { response, source: ResponseSource::Network })
    }

    async fn network_first(&self, request: &AssetRequest) -> Result<FetchOutcome, CacheError> {
        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(FetchOutcome::Responded { response, source: ResponseSource::Network }),
            Err(e) => {
                debug!("Network failed for {}, trying cache: {:#}", request.url(), e);
                match self.cached(request) {
                    Some(response) => {
                        Ok(FetchOutcome::Responded { response, source: ResponseSource::Cache })
                    }
                    None => Err(CacheError::fetch(request.url(), &e)),
                }
            }
        }
    }

    /// Looks the request up in the current version's container only.
    ///
    /// An unreadable container counts as a miss.
    fn cached(&self, request: &AssetRequest) -> Option<AssetResponse> {
        match self.storage.match_in(&self.version, request) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache {} unreadable, skipping lookup: {}", self.version, e);
                None
            }
        }
    }
}

fn is_write_through(url: &Url) -> bool {
    WRITE_THROUGH_PATTERNS.iter().any(|p| url.as_str().contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Mock fetcher serving the URL path as body; `offline` simulates no network.
    struct MockFetcher {
        offline: bool,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn online() -> Self {
            Self { offline: false, failing: HashSet::new(), calls: Mutex::new(Vec::new()) }
        }

        fn offline() -> Self {
            Self { offline: true, ..Self::online() }
        }

        fn failing_on(url: &str) -> Self {
            let mut fetcher = Self::online();
            fetcher.failing.insert(url.to_string());
            fetcher
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssetFetcher for MockFetcher {
        async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
            self.calls.lock().unwrap().push(request.cache_key());
            if self.offline || self.failing.contains(request.url().as_str()) {
                anyhow::bail!("Simulated network error");
            }
            Ok(AssetResponse::new(200, None, format!("network:{}", request.url())))
        }
    }

    fn settings(version: &str, policy: CachePolicy) -> OfflineConfig {
        OfflineConfig { cache_version: version.to_string(), policy, ..OfflineConfig::default() }
    }

    fn worker(dir: &TempDir, fetcher: MockFetcher, version: &str, policy: CachePolicy) -> OfflineWorker<MockFetcher> {
        OfflineWorker::new(CacheStorage::new(dir.path()), fetcher, &settings(version, policy)).unwrap()
    }

    fn get(url: &str) -> AssetRequest {
        AssetRequest::parse("GET", url).unwrap()
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("same-origin-bypass".parse::<CachePolicy>().unwrap(), CachePolicy::SameOriginBypass);
        assert_eq!("NETWORK-FIRST".parse::<CachePolicy>().unwrap(), CachePolicy::NetworkFirst);
        assert!("whatever".parse::<CachePolicy>().unwrap_err().contains("Unknown cache policy"));
        assert_eq!(CachePolicy::default().to_string(), "same-origin-bypass");
    }

    #[test]
    fn test_static_requests_resolved() {
        let dir = tempdir().unwrap();
        let worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);

        let urls: Vec<String> =
            worker.static_requests().unwrap().iter().map(|r| r.url().to_string()).collect();
        assert_eq!(
            urls,
            vec![
                "http://localhost:3000/",
                "http://localhost:3000/index.html",
                "http://localhost:3000/metadata.json",
                "https://cdn.tailwindcss.com/",
            ]
        );
    }

    #[tokio::test]
    async fn test_install_caches_every_asset() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);

        worker.install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);

        let cache = worker.storage().open("v1").unwrap();
        for request in worker.static_requests().unwrap() {
            assert!(cache.match_request(&request).is_some(), "{} missing", request.url());
        }
    }

    #[tokio::test]
    async fn test_install_failure_leaves_worker_parked() {
        let dir = tempdir().unwrap();
        let fetcher = MockFetcher::failing_on("http://localhost:3000/metadata.json");
        let mut worker = worker(&dir, fetcher, "v1", CachePolicy::SameOriginBypass);

        assert!(worker.install().await.is_err());
        assert_eq!(worker.state(), WorkerState::Parked);
        assert!(!worker.storage().has("v1"));
        assert!(!worker.resume());
        assert!(matches!(worker.activate(), Err(CacheError::NotInstalled)));
    }

    #[tokio::test]
    async fn test_activate_evicts_old_versions() {
        let dir = tempdir().unwrap();

        let mut old = worker(&dir, MockFetcher::online(), "haoxiangsheng-v2", CachePolicy::SameOriginBypass);
        old.install().await.unwrap();
        old.activate().unwrap();

        let mut new = worker(&dir, MockFetcher::online(), "haoxiangsheng-v3", CachePolicy::SameOriginBypass);
        new.install().await.unwrap();
        let deleted = new.activate().unwrap();

        assert_eq!(deleted, vec!["haoxiangsheng-v2"]);
        assert_eq!(new.storage().keys().unwrap(), vec!["haoxiangsheng-v3"]);
        assert_eq!(new.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_not_intercepted_before_activation() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();

        let outcome = worker.handle_fetch(&get("https://cdn.tailwindcss.com")).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Passthrough);
    }

    #[tokio::test]
    async fn test_non_get_never_intercepted() {
        let dir = tempdir().unwrap();
        for policy in [CachePolicy::SameOriginBypass, CachePolicy::NetworkFirst] {
            let mut worker = worker(&dir, MockFetcher::online(), "v1", policy);
            worker.install().await.unwrap();
            worker.activate().unwrap();

            for method in ["POST", "PUT", "DELETE", "HEAD"] {
                let request = AssetRequest::parse(method, "https://cdn.tailwindcss.com").unwrap();
                assert_eq!(worker.handle_fetch(&request).await.unwrap(), FetchOutcome::Passthrough);
            }
        }
    }

    #[tokio::test]
    async fn test_same_origin_never_served_from_cache() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();
        worker.activate().unwrap();

        // "/index.html" is in the cache, but same-origin requests bypass it.
        let request = get("http://localhost:3000/index.html");
        assert_eq!(worker.handle_fetch(&request).await.unwrap(), FetchOutcome::Passthrough);

        let (response, source) = worker.fetch(&request).await.unwrap();
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.text(), "network:http://localhost:3000/index.html");
    }

    #[tokio::test]
    async fn test_cross_origin_cache_first() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();
        worker.activate().unwrap();
        let installs = worker.fetcher.calls().len();

        let outcome = worker.handle_fetch(&get("https://cdn.tailwindcss.com")).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Responded { source: ResponseSource::Cache, .. }));
        assert_eq!(worker.fetcher.calls().len(), installs);
    }

    #[tokio::test]
    async fn test_cdn_miss_written_through() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();
        worker.activate().unwrap();

        let font = get("https://fonts.googleapis.com/css2?family=Inter");
        let first = worker.handle_fetch(&font).await.unwrap();
        assert!(matches!(first, FetchOutcome::Responded { source: ResponseSource::Network, .. }));

        let second = worker.handle_fetch(&font).await.unwrap();
        assert!(matches!(second, FetchOutcome::Responded { source: ResponseSource::Cache, .. }));
    }

    #[tokio::test]
    async fn test_other_cross_origin_not_written() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();
        worker.activate().unwrap();

        let image = get("https://picsum.photos/seed/x/400/400");
        worker.handle_fetch(&image).await.unwrap();
        assert!(worker.storage().match_request(&image).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_first_prefers_network() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::NetworkFirst);
        worker.install().await.unwrap();
        worker.activate().unwrap();

        let outcome = worker.handle_fetch(&get("http://localhost:3000/index.html")).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Responded { source: ResponseSource::Network, .. }));
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let dir = tempdir().unwrap();
        let mut installer = worker(&dir, MockFetcher::online(), "v1", CachePolicy::NetworkFirst);
        installer.install().await.unwrap();

        let mut worker = worker(&dir, MockFetcher::offline(), "v1", CachePolicy::NetworkFirst);
        assert!(worker.resume());

        let outcome = worker.handle_fetch(&get("http://localhost:3000/index.html")).await.unwrap();
        match outcome {
            FetchOutcome::Responded { response, source } => {
                assert_eq!(source, ResponseSource::Cache);
                assert_eq!(response.text(), "network:http://localhost:3000/index.html");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let miss = worker.handle_fetch(&get("http://localhost:3000/other.js")).await;
        assert!(matches!(miss, Err(CacheError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_network_first_does_not_write_through() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::NetworkFirst);
        worker.install().await.unwrap();
        worker.activate().unwrap();

        let font = get("https://fonts.googleapis.com/css2");
        worker.handle_fetch(&font).await.unwrap();
        assert!(worker.storage().match_request(&font).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resumed_worker_ignores_older_versions() {
        let dir = tempdir().unwrap();
        let cdn = get("https://cdn.tailwindcss.com");

        let mut old = worker(&dir, MockFetcher::online(), "haoxiangsheng-v2", CachePolicy::SameOriginBypass);
        old.install().await.unwrap();
        old.activate().unwrap();
        let mut stale = old.storage().open("haoxiangsheng-v2").unwrap();
        stale.put(&cdn, &AssetResponse::new(200, None, "stale")).unwrap();

        // Installed but never activated, so v2 is still on disk
        let mut new = worker(&dir, MockFetcher::online(), "haoxiangsheng-v3", CachePolicy::SameOriginBypass);
        new.install().await.unwrap();

        let mut resumed = worker(&dir, MockFetcher::offline(), "haoxiangsheng-v3", CachePolicy::SameOriginBypass);
        assert!(resumed.resume());

        let (response, source) = resumed.fetch(&cdn).await.unwrap();
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.text(), "network:https://cdn.tailwindcss.com/");
    }

    #[tokio::test]
    async fn test_network_first_ignores_older_versions() {
        let dir = tempdir().unwrap();
        let page = get("http://localhost:3000/legacy.html");

        let old = worker(&dir, MockFetcher::online(), "v1", CachePolicy::NetworkFirst);
        let mut stale = old.storage().open("v1").unwrap();
        stale.put(&page, &AssetResponse::new(200, None, "stale")).unwrap();

        let mut new = worker(&dir, MockFetcher::online(), "v2", CachePolicy::NetworkFirst);
        new.install().await.unwrap();
        let mut offline = worker(&dir, MockFetcher::offline(), "v2", CachePolicy::NetworkFirst);
        assert!(offline.resume());

        assert!(matches!(offline.handle_fetch(&page).await, Err(CacheError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_container_falls_back_to_network() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();
        worker.activate().unwrap();

        std::fs::write(dir.path().join("v1.json"), "{\"name\": \"v1\", \"entr").unwrap();

        let (response, source) = worker.fetch(&get("https://example.org/lib.js")).await.unwrap();
        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.text(), "network:https://example.org/lib.js");
    }

    #[tokio::test]
    async fn test_reinstall_rebuilds_corrupt_container() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("v1.json"), "garbage").unwrap();

        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        worker.install().await.unwrap();
        assert_eq!(worker.storage().open("v1").unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_reinstall_drops_removed_assets() {
        let dir = tempdir().unwrap();
        let mut full = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        full.install().await.unwrap();

        let mut config = settings("v1", CachePolicy::SameOriginBypass);
        config.assets = vec!["/".to_string(), "/index.html".to_string()];
        let mut trimmed =
            OfflineWorker::new(CacheStorage::new(dir.path()), MockFetcher::online(), &config).unwrap();
        trimmed.install().await.unwrap();

        let cache = trimmed.storage().open("v1").unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.match_request(&get("https://cdn.tailwindcss.com")).is_none());
    }

    #[test]
    fn test_resume_without_install() {
        let dir = tempdir().unwrap();
        let mut worker = worker(&dir, MockFetcher::online(), "v1", CachePolicy::SameOriginBypass);
        assert!(!worker.resume());
        assert_eq!(worker.state(), WorkerState::Parked);
    }

    #[test]
    fn test_write_through_patterns() {
        assert!(is_write_through(&Url::parse("https://cdn.tailwindcss.com").unwrap()));
        assert!(is_write_through(&Url::parse("https://fonts.gstatic.com/x.woff2").unwrap()));
        assert!(!is_write_through(&Url::parse("https://example.com/app.js").unwrap()));
    }

    #[test]
    fn test_invalid_origin() {
        let dir = tempdir().unwrap();
        let mut config = settings("v1", CachePolicy::SameOriginBypass);
        config.origin = "not a url".to_string();

        let result = OfflineWorker::new(CacheStorage::new(dir.path()), MockFetcher::online(), &config);
        assert!(matches!(result, Err(CacheError::InvalidUrl(_))));
    }
}
