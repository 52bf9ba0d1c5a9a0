//! Deal analysis command implementation.

use crate::analysis::{AnalysisSession, AnalysisState, DealAnalysisClient};
use crate::config::Config;
use crate::format::Formatter;
use crate::history::{FileStore, KeyValueStore, MemoryStore, SearchHistory};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Analyzes a product query and records it in the search history.
pub struct AnalyzeCommand {
    config: Config,
}

impl AnalyzeCommand {
    /// Creates a new analyze command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the analysis with the history stored under the data directory.
    ///
    /// An unreadable history falls back to an in-memory one for this run.
    pub async fn execute(&self, client: &DealAnalysisClient, query: &str) -> Result<String> {
        let store = FileStore::new(self.config.store_path());
        match SearchHistory::load(store).context("Failed to load search history") {
            Ok(mut history) => self.execute_with_history(client, &mut history, query).await,
            Err(e) => {
                warn!("{:#}", e);
                let mut history = SearchHistory::load(MemoryStore::new())?;
                self.execute_with_history(client, &mut history, query).await
            }
        }
    }

    /// Runs the analysis against a provided history (for testing).
    pub async fn execute_with_history<S: KeyValueStore>(
        &self,
        client: &DealAnalysisClient,
        history: &mut SearchHistory<S>,
        query: &str,
    ) -> Result<String> {
        let mut session = AnalysisSession::new();
        let ticket = session.begin(query)?;

        // History is a convenience; failing to save it must not block the query.
        if let Err(e) = history.record(ticket.query()) {
            warn!("{:#}", e);
        }

        let outcome = client.analyze(ticket.query()).await;
        session.finish(&ticket, outcome);

        match session.state() {
            AnalysisState::Success(analysis) => {
                info!("Analysis complete: {}", analysis.product_details.name);
                let formatter = Formatter::new(self.config.format);
                Ok(formatter.format_analysis(analysis))
            }
            AnalysisState::Failed(err) => {
                warn!("Analysis failed: {}", err.detail());
                Err(err.clone().into())
            }
            state => anyhow::bail!("Analysis did not complete: {:?}", state),
        }
    }
}
