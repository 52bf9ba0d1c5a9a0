//! Home recommendation command implementation.

use crate::analysis::DealAnalysisClient;
use crate::config::Config;
use crate::format::Formatter;

/// Lists AI-generated home recommendations.
pub struct RecommendCommand {
    config: Config,
}

impl RecommendCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Never fails: an unavailable model yields an empty list.
    pub async fn execute(&self, client: &DealAnalysisClient) -> String {
        let recommendations = client.get_home_recommendations().await;
        Formatter::new(self.config.format).format_recommendations(&recommendations)
    }
}
