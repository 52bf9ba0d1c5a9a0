//! Request and response values exchanged with the offline cache.

use super::error::CacheError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// An intercepted outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    method: String,
    url: Url,
}

impl AssetRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.trim().to_uppercase(), url }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Parses `url` as an absolute URL.
    pub fn parse(method: &str, url: &str) -> Result<Self, CacheError> {
        let url = Url::parse(url).map_err(|e| CacheError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self::new(method, url))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Only GET requests are ever served from or written to the cache.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// True if the request targets the same origin (scheme, host, port).
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }

    /// Identity of the request inside a cache container.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A response as stored in, or served from, the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(with = "base64_body")]
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, content_type, body: body.into() }
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

mod base64_body {
    use super::*;

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
