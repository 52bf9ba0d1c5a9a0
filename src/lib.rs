//! haoxiangsheng - AI deal analysis CLI for Chinese e-commerce
//!
//! Asks a Gemini model for money-saving purchase plans, keeps a short search
//! history, and maintains a versioned offline cache of static assets.

pub mod analysis;
pub mod commands;
pub mod config;
pub mod format;
pub mod gemini;
pub mod history;
pub mod offline;

pub use analysis::{AnalysisError, DealAnalysisClient, DealAnalysisResponse, HomeRecommendation};
pub use config::Config;
pub use gemini::{GeminiClient, GenerativeModel};
