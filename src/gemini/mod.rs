//! Gemini transport: the generative model seam and its REST implementation.

pub mod client;
pub mod schema;

pub use client::{GeminiClient, GenerateRequest, GenerativeModel};
