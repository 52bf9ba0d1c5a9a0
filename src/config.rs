//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::offline::CachePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "haoxiangsheng";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key; never written back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the Gemini REST API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Directory for search history and caches
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Reject analysis replies with no plans
    #[serde(default = "default_true")]
    pub require_plans: bool,

    /// Offline asset cache settings
    #[serde(default)]
    pub offline: OfflineConfig,
}

/// Offline asset cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Name of the current cache container
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin of the application; relative assets resolve against it
    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default)]
    pub policy: CachePolicy,

    /// Static shell assets cached on install
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_cache_version() -> String {
    "haoxiangsheng-v3".to_string()
}

fn default_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_assets() -> Vec<String> {
    ["/", "/index.html", "/metadata.json", "https://cdn.tailwindcss.com"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            origin: default_origin(),
            policy: CachePolicy::default(),
            assets: default_assets(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
            format: OutputFormat::Table,
            data_dir: None,
            require_plans: true,
            offline: OfflineConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_DIR).join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Some(key) = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.is_empty())
        {
            self.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("HXS_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }

        if let Ok(proxy) = std::env::var("HXS_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(timeout) = std::env::var("HXS_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = t;
            }
        }

        self
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
    }

    /// File backing the local key-value store.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }

    /// Root directory of offline cache containers.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir().join("caches")
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
