//! CLI command implementations.

pub mod analyze;
pub mod cache;
pub mod history;
pub mod recommend;

pub use analyze::AnalyzeCommand;
pub use cache::CacheCommand;
pub use history::HistoryCommand;
pub use recommend::RecommendCommand;
