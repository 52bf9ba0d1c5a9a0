//! Search history command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::history::{FileStore, KeyValueStore, SearchHistory};
use anyhow::{Context, Result};

/// Lists or clears the recent search history.
pub struct HistoryCommand {
    config: Config,
}

impl HistoryCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn open(&self) -> Result<SearchHistory<FileStore>> {
        SearchHistory::load(FileStore::new(self.config.store_path()))
            .context("Failed to load search history")
    }

    pub fn list(&self) -> Result<String> {
        Ok(self.list_with(&self.open()?))
    }

    pub fn clear(&self) -> Result<String> {
        self.clear_with(&mut self.open()?)
    }

    pub fn list_with<S: KeyValueStore>(&self, history: &SearchHistory<S>) -> String {
        Formatter::new(self.config.format).format_history(history.entries())
    }

    pub fn clear_with<S: KeyValueStore>(&self, history: &mut SearchHistory<S>) -> Result<String> {
        let removed = history.len();
        history.clear()?;
        Ok(format!("Cleared {} searches.", removed))
    }
}
