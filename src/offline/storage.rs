//! Named, versioned cache containers persisted as one JSON file each.

use super::error::CacheError;
use super::fetcher::AssetFetcher;
use super::request::{AssetRequest, AssetResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const EXTENSION: &str = "json";

/// Writes through a sibling temp file so a crash never leaves a truncated file.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}

fn validate_name(name: &str) -> Result<(), CacheError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidName(name.to_string()))
    }
}

/// Root of all cache containers.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, EXTENSION))
    }

    /// Opens a container, creating it if absent.
    pub fn open(&self, name: &str) -> Result<Cache, CacheError> {
        validate_name(name)?;
        let path = self.path_for(name);

        if path.exists() {
            return Cache::load(name, path);
        }

        debug!("Creating cache {}", name);
        let cache = Cache { name: name.to_string(), path, entries: BTreeMap::new() };
        cache.persist()?;
        Ok(cache)
    }

    pub fn has(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.path_for(name).exists()
    }

    /// Names of all containers, sorted.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes a container. Returns false if it did not exist.
    pub fn delete(&self, name: &str) -> Result<bool, CacheError> {
        if !self.has(name) {
            return Ok(false);
        }
        std::fs::remove_file(self.path_for(name))?;
        info!("Deleted cache {}", name);
        Ok(true)
    }

    /// Looks the request up in one container. A missing container is a miss.
    pub fn match_in(&self, name: &str, request: &AssetRequest) -> Result<Option<AssetResponse>, CacheError> {
        if !self.has(name) {
            return Ok(None);
        }
        Ok(Cache::load(name, self.path_for(name))?.match_request(request))
    }

    /// Looks the request up in every container, in name order.
    pub fn match_request(&self, request: &AssetRequest) -> Result<Option<AssetResponse>, CacheError> {
        for name in self.keys()? {
            let cache = Cache::load(&name, self.path_for(&name))?;
            if let Some(response) = cache.match_request(request) {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    name: String,
    entries: BTreeMap<String, AssetResponse>,
}

/// One cache container mapping request identity to a stored response.
#[derive(Debug)]
pub struct Cache {
    name: String,
    path: PathBuf,
    entries: BTreeMap<String, AssetResponse>,
}

impl Cache {
    fn load(name: &str, path: PathBuf) -> Result<Self, CacheError> {
        let content = std::fs::read_to_string(&path)?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { name: name.to_string(), path, entries: file.entries })
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = CacheFile { name: self.name.clone(), entries: self.entries.clone() };
        let content = serde_json::to_string(&file).map_err(|e| CacheError::Corrupt {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored request keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Returns a copy of the stored response, if any.
    pub fn match_request(&self, request: &AssetRequest) -> Option<AssetResponse> {
        self.entries.get(&request.cache_key()).cloned()
    }

    /// Stores a copy of `response` under the request's identity.
    pub fn put(&mut self, request: &AssetRequest, response: &AssetResponse) -> Result<(), CacheError> {
        self.entries.insert(request.cache_key(), response.clone());
        debug!("Cached {} in {}", request.cache_key(), self.name);
        self.persist()
    }

    /// Fetches every request and stores all of them, or none.
    ///
    /// A transport failure or non-2xx response aborts before anything is written.
    pub async fn add_all(
        &mut self,
        fetcher: &impl AssetFetcher,
        requests: &[AssetRequest],
    ) -> Result<(), CacheError> {
        let fetched = fetch_all(fetcher, requests).await?;
        self.entries.extend(fetched);
        self.persist()?;
        info!("Cached {} assets in {}", requests.len(), self.name);
        Ok(())
    }

    /// Like [`Cache::add_all`], but the container ends up holding exactly
    /// `requests`. On failure the previous contents are kept.
    pub async fn replace_all(
        &mut self,
        fetcher: &impl AssetFetcher,
        requests: &[AssetRequest],
    ) -> Result<(), CacheError> {
        let fetched = fetch_all(fetcher, requests).await?;
        let entries: BTreeMap<_, _> = fetched.into_iter().collect();
        let stale = self.entries.keys().filter(|k| !entries.contains_key(*k)).count();
        self.entries = entries;
        self.persist()?;
        info!("Cached {} assets in {}, dropped {} stale", requests.len(), self.name, stale);
        Ok(())
    }
}

async fn fetch_all(
    fetcher: &impl AssetFetcher,
    requests: &[AssetRequest],
) -> Result<Vec<(String, AssetResponse)>, CacheError> {
    let mut fetched = Vec::with_capacity(requests.len());

    for request in requests {
        let response =
            fetcher.fetch(request).await.map_err(|e| CacheError::fetch(request.url(), &e))?;
        if !response.is_ok() {
            return Err(CacheError::BadStatus { url: request.url().to_string(), status: response.status });
        }
        fetched.push((request.cache_key(), response));
    }

    Ok(fetched)
}
