//! Offline asset cache: versioned containers and the fetch-intercepting worker.

pub mod error;
pub mod fetcher;
pub mod request;
pub mod storage;
pub mod worker;

pub use error::CacheError;
pub use fetcher::{AssetFetcher, HttpFetcher};
pub use request::{AssetRequest, AssetResponse};
pub use storage::{Cache, CacheStorage};
pub use worker::{CachePolicy, FetchOutcome, OfflineWorker, ResponseSource, WorkerState};
