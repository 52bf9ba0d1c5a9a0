//! Offline cache failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache name: '{0}'. Use letters, digits, '.', '-' or '_'.")]
    InvalidName(String),

    #[error("Invalid URL {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Fetching {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Worker must be installed before it can activate")]
    NotInstalled,

    #[error("Cache '{name}' is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Cache storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    pub(crate) fn fetch(url: impl ToString, err: &anyhow::Error) -> Self {
        CacheError::Fetch { url: url.to_string(), reason: format!("{:#}", err) }
    }
}
