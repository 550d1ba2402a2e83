//! Generative-text provider client
//!
//! A single operation: send a prompt, get text back. Used only by the
//! admin panel.

use anyhow::Result;
use serde_json::{Value, json};

/// Generation configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Provider API key
    pub api_key: String,
    /// Messages endpoint URL
    pub api_url: String,
    /// Model identifier
    pub model: String,
}

impl AiConfig {
    /// Create a new AiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ANTHROPIC_API_KEY`: Provider API key
    /// - `ANTHROPIC_API_URL`: Messages endpoint (default: hosted API)
    /// - `GENERATION_MODEL`: Model identifier (default: `claude-sonnet-4-20250514`)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        let api_url = std::env::var("ANTHROPIC_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string());
        let model = std::env::var("GENERATION_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        Ok(AiConfig {
            api_key,
            api_url,
            model,
        })
    }
}

/// Client for the generative-text provider
#[derive(Clone)]
pub struct TextGenerator {
    http: reqwest::Client,
    config: AiConfig,
}

impl TextGenerator {
    /// Build a generator from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            config: AiConfig::from_env()?,
        })
    }

    /// Generate text for a prompt
    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}]
        });

        let response = self
            .http
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("text provider returned {}", response.status());
        }

        let body: Value = response.json().await?;
        body["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("text provider response missing content"))
    }
}
