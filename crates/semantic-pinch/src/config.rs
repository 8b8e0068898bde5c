//! Runtime configuration for backends, media polling and navigation.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. Environment variables (e.g. `PINCH_BACKEND`, `OPENAI_API_KEY`)
//! 3. TOML config file (`--config pinch.toml`)
//! 4. Built-in defaults
//!
//! The config is built once at startup and handed to whatever needs it;
//! there is no global client state.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::errors::TransformError;

const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/transform";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 200;
const DEFAULT_ARTICLE_MAX_TOKENS: u32 = 1_000;
const DEFAULT_REPLICATE_URL: &str = "https://api.replicate.com/v1";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_MAX_POLLS: u32 = 120;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

const ENV_BACKEND: &str = "PINCH_BACKEND";
const ENV_PROXY_URL: &str = "PINCH_PROXY_URL";
const ENV_OPENAI_BASE_URL: &str = "PINCH_OPENAI_BASE_URL";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_OPENAI_MODEL: &str = "PINCH_OPENAI_MODEL";
const ENV_REPLICATE_URL: &str = "PINCH_REPLICATE_URL";
const ENV_REPLICATE_TOKEN: &str = "REPLICATE_API_TOKEN";
const ENV_REUSE_CACHE: &str = "PINCH_REUSE_CACHE";

/// Which text-generation protocol to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `{content, toLevel}` event-stream proxy.
    Proxy,
    /// OpenAI-compatible chat completions, called directly.
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proxy" => Ok(Self::Proxy),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown backend '{other}' (expected proxy or openai)")),
        }
    }
}

/// Which ladder the session walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LadderKind {
    /// emoji → word → sentence → paragraph → article
    Text,
    /// emoji → text → image
    Multimodal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Full URL of the transform endpoint.
    pub url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROXY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL of the OpenAI-compatible API (`…/v1`).
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Token cap for every level except the article.
    pub max_tokens: u32,
    pub article_max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            article_max_tokens: DEFAULT_ARTICLE_MAX_TOKENS,
        }
    }
}

/// Image generation / captioning (Replicate-style prediction API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub poll_interval_ms: u64,
    /// Give up on a prediction after this many status polls.
    pub max_polls: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REPLICATE_URL.to_string(),
            api_token: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl MediaConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    pub backend: BackendKind,
    pub ladder: LadderKind,
    pub proxy: ProxyConfig,
    pub openai: OpenAiConfig,
    pub media: MediaConfig,
    pub request_timeout_secs: u64,
    /// Serve a cached level instead of re-transforming. Off by default:
    /// every move recomputes.
    pub reuse_cached: bool,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Proxy,
            ladder: LadderKind::Text,
            proxy: ProxyConfig::default(),
            openai: OpenAiConfig::default(),
            media: MediaConfig::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            reuse_cached: false,
        }
    }
}

impl PinchConfig {
    /// Optional TOML file, then environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; unset or unparseable values are skipped.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup(ENV_BACKEND).and_then(|v| v.parse().ok()) {
            self.backend = backend;
        }
        if let Some(url) = lookup(ENV_PROXY_URL) {
            self.proxy.url = url;
        }
        if let Some(url) = lookup(ENV_OPENAI_BASE_URL) {
            self.openai.base_url = url;
        }
        if let Some(key) = lookup(ENV_OPENAI_API_KEY).filter(|k| !k.trim().is_empty()) {
            self.openai.api_key = Some(key);
        }
        if let Some(model) = lookup(ENV_OPENAI_MODEL) {
            self.openai.model = model;
        }
        if let Some(url) = lookup(ENV_REPLICATE_URL) {
            self.media.base_url = url;
        }
        if let Some(token) = lookup(ENV_REPLICATE_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.media.api_token = Some(token);
        }
        if let Some(reuse) = lookup(ENV_REUSE_CACHE) {
            self.reuse_cached = matches!(reuse.trim(), "1" | "true" | "yes");
        }
    }

    /// Validate all sub-configs; return an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("proxy.url", &self.proxy.url),
            ("openai.base_url", &self.openai.base_url),
            ("media.base_url", &self.media.base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{name} must be an http(s) URL, got '{url}'"));
            }
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(format!(
                "openai.temperature must be in [0, 2], got {}",
                self.openai.temperature
            ));
        }
        if self.openai.max_tokens == 0 || self.openai.article_max_tokens == 0 {
            return Err("openai token limits must be > 0".to_string());
        }
        if self.media.poll_interval_ms == 0 {
            return Err("media.poll_interval_ms must be > 0".to_string());
        }
        if self.media.max_polls == 0 {
            return Err("media.max_polls must be > 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }

    /// The one HTTP client shared by every backend in the process.
    pub fn http_client(&self) -> Result<reqwest::Client, TransformError> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
            .map_err(|e| TransformError::Configuration(format!("failed to build HTTP client: {e}")))
    }
}
