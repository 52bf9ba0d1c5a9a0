//! Data models for deal analysis replies and home recommendations.
//!
//! Field names follow the camelCase JSON the model is asked to produce, so the
//! same types serve as the parse target and as the JSON output format.

use serde::{Deserialize, Serialize};
use std::fmt;

const PLACEHOLDER_IMAGE_BASE: &str = "https://picsum.photos/seed";

/// Builds a deterministic placeholder image URL for a seed string.
pub fn placeholder_image(seed: &str, size: u32) -> String {
    format!("{}/{}/{}/{}", PLACEHOLDER_IMAGE_BASE, urlencoding::encode(seed), size, size)
}

/// The product the user asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub name: String,
    /// Marketplace the prices refer to
    pub platform: String,
    pub original_price: f64,
    pub current_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductDetails {
    /// Absolute discount against the original price (never negative).
    pub fn discount(&self) -> f64 {
        (self.original_price - self.current_price).max(0.0)
    }

    /// Returns discount percentage if the current price is below the original.
    pub fn discount_percent(&self) -> Option<u8> {
        if self.original_price <= 0.0 || self.current_price >= self.original_price {
            return None;
        }
        let discount = (self.discount() / self.original_price * 100.0).round() as u8;
        Some(discount.min(99))
    }

    /// Image URL from the reply, or a placeholder seeded by the product name.
    pub fn image(&self) -> String {
        self.image_url.clone().unwrap_or_else(|| placeholder_image(&self.name, 400))
    }
}

/// Purchase timing strategy of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    /// Best price obtainable right now
    Immediate,
    /// Predicted discount at a future sale event
    Future,
}

impl PlanType {
    pub const ALL: [PlanType; 2] = [PlanType::Immediate, PlanType::Future];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Immediate => "immediate",
            PlanType::Future => "future",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One purchase-timing plan with its ordered steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingPlan {
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    pub label: String,
    pub steps: Vec<String>,
    pub final_price: f64,
    pub total_savings: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Coupon labels, index-aligned with `steps`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupons: Option<Vec<String>>,
    /// Only meaningful for future plans, e.g. "需等待约 45 天"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_actionable: Option<bool>,
}

impl SavingPlan {
    /// Coupon label for the step at `index`, if any.
    pub fn coupon_for_step(&self, index: usize) -> Option<&str> {
        self.coupons
            .as_ref()
            .and_then(|c| c.get(index))
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
    }
}

/// Binary buy-now-or-wait advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyAdvice {
    BuyNow,
    Wait,
}

impl BuyAdvice {
    pub const ALL: [BuyAdvice; 2] = [BuyAdvice::BuyNow, BuyAdvice::Wait];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuyAdvice::BuyNow => "buy_now",
            BuyAdvice::Wait => "wait",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            BuyAdvice::BuyNow => "建议现在入手",
            BuyAdvice::Wait => "建议再等等",
        }
    }
}

/// Forecast for the next notable sale event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePrediction {
    pub next_event_name: String,
    pub expected_price: f64,
    #[serde(default)]
    pub expected_drop: f64,
    pub buy_now_or_wait: BuyAdvice,
    #[serde(default)]
    pub reasoning: String,
    /// Percentage in 0-100; not range-checked
    pub confidence: f64,
}

/// An alternative product suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarProduct {
    pub name: String,
    pub price: f64,
    pub platform: String,
    #[serde(default)]
    pub advantage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A dated price observation for trend charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String,
    pub price: f64,
}

/// Full analysis of a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAnalysisResponse {
    pub product_details: ProductDetails,
    /// Display order; the first plan is selected by default
    pub plans: Vec<SavingPlan>,
    pub similar_recommendations: Vec<SimilarProduct>,
    pub price_trends: Vec<PricePoint>,
    pub price_prediction: PricePrediction,
    pub decision_advice: String,
}

impl DealAnalysisResponse {
    /// The plan shown first.
    pub fn default_plan(&self) -> Option<&SavingPlan> {
        self.plans.first()
    }

    /// First plan of the given type.
    pub fn plan(&self, plan_type: PlanType) -> Option<&SavingPlan> {
        self.plans.iter().find(|p| p.plan_type == plan_type)
    }

    /// Plan with the lowest final price.
    pub fn best_plan(&self) -> Option<&SavingPlan> {
        self.plans.iter().min_by(|a, b| a.final_price.total_cmp(&b.final_price))
    }

    /// Lowest price in the trend series.
    pub fn lowest_trend_price(&self) -> Option<&PricePoint> {
        self.price_trends.iter().min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

/// Closed set of home recommendation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "时尚")]
    Fashion,
    #[serde(rename = "潮流")]
    Trend,
    #[serde(rename = "家电")]
    Appliance,
    #[serde(rename = "数码")]
    Digital,
    #[serde(rename = "生活")]
    Life,
}

impl Category {
    pub const ALL: [Category; 5] =
        [Category::Fashion, Category::Trend, Category::Appliance, Category::Digital, Category::Life];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fashion => "时尚",
            Category::Trend => "潮流",
            Category::Appliance => "家电",
            Category::Digital => "数码",
            Category::Life => "生活",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of marketplaces for home recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marketplace {
    #[serde(rename = "京东")]
    Jd,
    #[serde(rename = "天猫")]
    Tmall,
    #[serde(rename = "淘宝")]
    Taobao,
}

impl Marketplace {
    pub const ALL: [Marketplace; 3] = [Marketplace::Jd, Marketplace::Tmall, Marketplace::Taobao];

    pub fn as_str(&self) -> &'static str {
        match self {
            Marketplace::Jd => "京东",
            Marketplace::Tmall => "天猫",
            Marketplace::Taobao => "淘宝",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model-generated product suggestion for the landing screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeRecommendation {
    pub name: String,
    pub category: Category,
    pub price: f64,
    pub original_price: f64,
    pub platform: Marketplace,
    pub reason: String,
    pub image_seed: String,
}

impl HomeRecommendation {
    pub fn image(&self) -> String {
        placeholder_image(&self.image_seed, 400)
    }

    /// Savings against the original price (never negative).
    pub fn savings(&self) -> f64 {
        (self.original_price - self.price).max(0.0)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_discount_percent() {
        let product = sample_response().product_details;
        assert_eq!(product.discount(), 500.0);
        assert_eq!(product.discount_percent(), Some(8));

        let mut product = product;
        product.current_price = product.original_price;
        assert!(product.discount_percent().is_none());

        product.original_price = 1000.0;
        product.current_price = 1.0;
        assert_eq!(product.discount_percent(), Some(99));
    }

    #[test]
    fn test_product_image_fallback() {
        let mut product = sample_response().product_details;
        assert_eq!(product.image(), "https://picsum.photos/seed/iPhone%2016%20128GB/400/400");

        product.image_url = Some("https://img.example/x.png".to_string());
        assert_eq!(product.image(), "https://img.example/x.png");
    }

    #[test]
    fn test_plan_selection() {
        let response = sample_response();
        assert_eq!(response.default_plan().unwrap().plan_type, PlanType::Immediate);
        assert_eq!(response.plan(PlanType::Future).unwrap().final_price, 4899.0);
        assert_eq!(response.best_plan().unwrap().plan_type, PlanType::Future);
        assert_eq!(response.lowest_trend_price().unwrap().date, "2026-09-01");
    }

    #[test]
    fn test_coupon_for_step() {
        let response = sample_response();
        let plan = &response.plans[0];
        assert_eq!(plan.coupon_for_step(0), Some("满5000减300"));
        assert_eq!(plan.coupon_for_step(1), None);
        assert_eq!(plan.coupon_for_step(5), None);
        assert_eq!(response.plans[1].coupon_for_step(0), None);
    }

    #[test]
    fn test_plan_type_wire_names() {
        let json = serde_json::to_string(&PlanType::Immediate).unwrap();
        assert_eq!(json, "\"immediate\"");
        let parsed: PlanType = serde_json::from_str("\"future\"").unwrap();
        assert_eq!(parsed, PlanType::Future);
        assert!(serde_json::from_str::<PlanType>("\"someday\"").is_err());
    }

    #[test]
    fn test_buy_advice_wire_names() {
        let parsed: BuyAdvice = serde_json::from_str("\"buy_now\"").unwrap();
        assert_eq!(parsed, BuyAdvice::BuyNow);
        assert_eq!(BuyAdvice::Wait.as_str(), "wait");
    }

    #[test]
    fn test_plan_serializes_type_field() {
        let response = sample_response();
        let value = serde_json::to_value(&response.plans[1]).unwrap();
        assert_eq!(value["type"], "future");
        assert_eq!(value["finalPrice"], 4899.0);
        assert_eq!(value["waitTime"], "需等待约 25 天");
        assert!(value.get("plan_type").is_none());
    }

    #[test]
    fn test_response_roundtrip_keeps_required_fields() {
        let response = sample_response();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"productDetails\""));
        assert!(json.contains("\"priceTrends\""));

        let parsed: DealAnalysisResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_prediction_optional_fields_default() {
        let json = r#"{
            "nextEventName": "618",
            "expectedPrice": 99.0,
            "buyNowOrWait": "buy_now",
            "confidence": 70
        }"#;
        let prediction: PricePrediction = serde_json::from_str(json).unwrap();
        assert_eq!(prediction.expected_drop, 0.0);
        assert!(prediction.reasoning.is_empty());
        assert_eq!(prediction.confidence, 70.0);
    }

    #[test]
    fn test_recommendation_chinese_enums() {
        let json = r#"{
            "name": "降噪耳机",
            "category": "数码",
            "price": 899,
            "originalPrice": 1299,
            "platform": "天猫",
            "reason": "限时直降",
            "imageSeed": "headphones"
        }"#;
        let rec: HomeRecommendation = serde_json::from_str(json).unwrap();
        assert_eq!(rec.category, Category::Digital);
        assert_eq!(rec.platform, Marketplace::Tmall);
        assert_eq!(rec.savings(), 400.0);
        assert_eq!(rec.image(), "https://picsum.photos/seed/headphones/400/400");
    }

    #[test]
    fn test_recommendation_rejects_unknown_platform() {
        let json = r#"{
            "name": "x", "category": "生活", "price": 1, "originalPrice": 2,
            "platform": "拼多多", "reason": "", "imageSeed": "x"
        }"#;
        assert!(serde_json::from_str::<HomeRecommendation>(json).is_err());
    }

    #[test]
    fn test_enum_sets() {
        assert_eq!(Category::ALL.len(), 5);
        assert_eq!(Marketplace::ALL.map(|m| m.as_str()), ["京东", "天猫", "淘宝"]);
        assert_eq!(sample_recommendation().category.to_string(), "家电");
    }
}
