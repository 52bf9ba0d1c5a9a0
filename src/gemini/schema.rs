//! Structured-output schemas sent with each `generateContent` request.
//!
//! Gemini accepts an OpenAPI subset: upper-case type names, `enum` for
//! closed string sets and `required` lists per object.

use crate::analysis::models::{BuyAdvice, Category, Marketplace, PlanType};
use serde_json::{json, Value};

/// Top-level fields every analysis reply must carry.
pub const ANALYSIS_REQUIRED: [&str; 6] = [
    "productDetails",
    "plans",
    "pricePrediction",
    "decisionAdvice",
    "priceTrends",
    "similarRecommendations",
];

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn number() -> Value {
    json!({ "type": "NUMBER" })
}

fn string_enum(values: &[&str]) -> Value {
    json!({ "type": "STRING", "enum": values })
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": string() })
}

/// Schema for a full deal analysis reply.
pub fn deal_analysis() -> Value {
    let plan_types: Vec<&str> = PlanType::ALL.iter().map(PlanType::as_str).collect();
    let advice: Vec<&str> = BuyAdvice::ALL.iter().map(BuyAdvice::as_str).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "productDetails": {
                "type": "OBJECT",
                "properties": {
                    "name": string(),
                    "platform": string(),
                    "originalPrice": number(),
                    "currentPrice": number(),
                    "imageUrl": string(),
                    "description": string()
                },
                "required": ["name", "originalPrice", "currentPrice", "platform"]
            },
            "plans": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": string_enum(&plan_types),
                        "label": string(),
                        "isActionable": { "type": "BOOLEAN" },
                        "steps": string_array(),
                        "finalPrice": number(),
                        "totalSavings": number(),
                        "explanation": string(),
                        "coupons": string_array(),
                        "waitTime": string()
                    },
                    "required": ["type", "label", "steps", "finalPrice", "totalSavings"]
                }
            },
            "pricePrediction": {
                "type": "OBJECT",
                "properties": {
                    "nextEventName": string(),
                    "expectedPrice": number(),
                    "expectedDrop": number(),
                    "buyNowOrWait": string_enum(&advice),
                    "reasoning": string(),
                    "confidence": number()
                },
                "required": ["nextEventName", "expectedPrice", "buyNowOrWait", "confidence"]
            },
            "decisionAdvice": string(),
            "priceTrends": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": { "date": string(), "price": number() },
                    "required": ["date", "price"]
                }
            },
            "similarRecommendations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string(),
                        "price": number(),
                        "platform": string(),
                        "advantage": string()
                    },
                    "required": ["name", "price", "platform"]
                }
            }
        },
        "required": ANALYSIS_REQUIRED
    })
}

/// Schema for the home recommendation list.
pub fn home_recommendations() -> Value {
    let categories: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    let platforms: Vec<&str> = Marketplace::ALL.iter().map(Marketplace::as_str).collect();

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": string(),
                "category": string_enum(&categories),
                "price": number(),
                "originalPrice": number(),
                "platform": string_enum(&platforms),
                "reason": string(),
                "imageSeed": string()
            },
            "required": ["name", "category", "price", "originalPrice", "platform", "reason", "imageSeed"]
        }
    })
}
