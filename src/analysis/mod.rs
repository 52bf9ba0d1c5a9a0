//! Deal analysis: prompt shaping, reply validation, typed errors and the
//! displayed-state session.

pub mod client;
pub mod error;
pub mod models;
pub mod prompt;
pub mod session;

pub use client::DealAnalysisClient;
pub use error::AnalysisError;
pub use models::{
    BuyAdvice, Category, DealAnalysisResponse, HomeRecommendation, Marketplace, PlanType,
    PricePoint, PricePrediction, ProductDetails, SavingPlan, SimilarProduct,
};
pub use session::{AnalysisSession, AnalysisState, Ticket};
