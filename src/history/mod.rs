//! Recent search history: at most five distinct queries, most recent first.

pub mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Storage key holding the JSON-encoded history list.
pub const HISTORY_KEY: &str = "haoxiangsheng_search_history";

/// Maximum number of remembered queries.
pub const MAX_ENTRIES: usize = 5;

/// Search history persisted under [`HISTORY_KEY`].
///
/// Every mutation is written to the store before it is committed in memory,
/// so both representations stay equal.
pub struct SearchHistory<S: KeyValueStore> {
    store: S,
    entries: Vec<String>,
}

impl<S: KeyValueStore> SearchHistory<S> {
    /// Loads history from the store. A corrupt value loads as empty.
    pub fn load(store: S) -> Result<Self> {
        let entries = match store.get(HISTORY_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(MAX_ENTRIES);
                    entries
                }
                Err(e) => {
                    warn!("Ignoring corrupt search history: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self { store, entries })
    }

    /// Most-recent-first entries.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records a query at the front. Returns false for blank input.
    ///
    /// An exact duplicate moves to the front; the oldest entry is evicted
    /// beyond [`MAX_ENTRIES`].
    pub fn record(&mut self, query: &str) -> Result<bool> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(false);
        }

        let mut next: Vec<String> = Vec::with_capacity(MAX_ENTRIES);
        next.push(query.to_string());
        next.extend(self.entries.iter().filter(|e| e.as_str() != query).cloned());
        next.truncate(MAX_ENTRIES);

        self.persist(&next)?;
        debug!("Recorded search: {}", query);
        self.entries = next;
        Ok(true)
    }

    /// Removes the history key entirely.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(HISTORY_KEY).context("Failed to clear search history")?;
        self.entries.clear();
        Ok(())
    }

    fn persist(&self, entries: &[String]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, &raw).context("Failed to save search history")
    }
}
