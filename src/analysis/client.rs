//! Deal analysis over an injected generative model.

use super::error::AnalysisError;
use super::models::{DealAnalysisResponse, HomeRecommendation, PlanType};
use super::prompt;
use crate::gemini::{schema, GenerateRequest, GenerativeModel};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parses and validates a deal analysis reply.
///
/// Missing required fields, unknown enum values and (when `require_plans`)
/// an empty `plans` array are all parse errors. A `waitTime` on an immediate
/// plan is dropped.
pub fn parse_analysis(text: &str, require_plans: bool) -> Result<DealAnalysisResponse, AnalysisError> {
    let mut response: DealAnalysisResponse = serde_json::from_str(text).map_err(|e| {
        debug!("Rejected analysis reply: {}", e);
        AnalysisError::parse(e.to_string())
    })?;

    if require_plans && response.plans.is_empty() {
        return Err(AnalysisError::parse("reply contains no plans"));
    }

    for plan in &mut response.plans {
        if plan.plan_type == PlanType::Immediate && plan.wait_time.take().is_some() {
            debug!("Dropped waitTime from immediate plan '{}'", plan.label);
        }
    }

    Ok(response)
}

/// Parses the home recommendation list.
pub fn parse_recommendations(text: &str) -> Result<Vec<HomeRecommendation>, AnalysisError> {
    serde_json::from_str(text).map_err(|e| AnalysisError::parse(e.to_string()))
}

/// Client for deal analysis and home recommendations.
///
/// Holds no state beyond the shared model handle; every call is independent.
#[derive(Clone)]
pub struct DealAnalysisClient {
    model: Arc<dyn GenerativeModel>,
    require_plans: bool,
}

impl DealAnalysisClient {
    /// Creates a client around a model built once at startup.
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model, require_plans: true }
    }

    /// Sets whether an empty `plans` array is rejected.
    pub fn require_plans(mut self, require: bool) -> Self {
        self.require_plans = require;
        self
    }

    /// Analyzes a product query.
    ///
    /// Blank queries fail with [`AnalysisError::Input`] without calling the
    /// model. There is no retry.
    pub async fn analyze(&self, query: &str) -> Result<DealAnalysisResponse, AnalysisError> {
        if query.trim().is_empty() {
            return Err(AnalysisError::Input);
        }

        info!("Analyzing: {}", query);

        let request = GenerateRequest::new(prompt::deal_analysis(query), schema::deal_analysis());
        let text = self.model.generate(&request).await.map_err(|e| {
            warn!("Analysis call failed: {:#}", e);
            AnalysisError::network(&e)
        })?;

        let response = parse_analysis(&text, self.require_plans)?;
        debug!(
            "Analysis for '{}' returned {} plans, {} trend points",
            query,
            response.plans.len(),
            response.price_trends.len()
        );
        Ok(response)
    }

    /// Fetches home recommendations; any failure yields an empty list.
    pub async fn get_home_recommendations(&self) -> Vec<HomeRecommendation> {
        let request =
            GenerateRequest::new(prompt::HOME_RECOMMENDATIONS, schema::home_recommendations());

        let text = match self.model.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to load recommendations: {:#}", e);
                return Vec::new();
            }
        };

        match parse_recommendations(&text) {
            Ok(recommendations) => {
                info!("Loaded {} recommendations", recommendations.len());
                recommendations
            }
            Err(e) => {
                warn!("Failed to parse recommendations: {}", e.detail());
                Vec::new()
            }
        }
    }

    /// Model identifier, for display.
    pub fn model_name(&self) -> &str {
        self.model.model()
    }
}
