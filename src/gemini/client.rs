//! HTTP client for the Gemini `generateContent` endpoint.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;

/// One structured-output generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Natural-language instruction
    pub prompt: String,
    /// Output schema the reply must follow
    pub schema: Value,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, schema: Value) -> Self {
        Self { prompt: prompt.into(), schema }
    }
}

/// Trait for generative model calls - enables mocking for tests.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends the request and returns the raw JSON text of the reply.
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Returns the model identifier used for requests.
    fn model(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Gemini REST client. Build one at startup and share it.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new client from the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, config.api_base.clone())
    }

    /// Creates a new client against a custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: String) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => anyhow::bail!("No API key configured. Set GEMINI_API_KEY."),
        };

        let body = GenerateContentBody {
            contents: [RequestContent { role: "user", parts: [RequestPart { text: &request.prompt }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
            },
        };
        let body = serde_json::to_string(&body).context("Failed to encode request")?;

        let url = self.endpoint();
        info!("Calling model {}", self.model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .body(body)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 {
            warn!("Model quota exhausted (429).");
            anyhow::bail!("Rate limited by model endpoint.");
        }

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        let raw = response.text().await.context("Failed to read response body")?;
        let envelope: GenerateContentResponse =
            serde_json::from_str(&raw).context("Malformed generateContent envelope")?;

        if let Some(reason) = envelope.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_ref()) {
            anyhow::bail!("Prompt blocked: {}", reason);
        }

        envelope.text().context("Model returned no text")
    }

    fn model(&self) -> &str {
        &self.model
    }
}
