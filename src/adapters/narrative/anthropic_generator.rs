//! Anthropic Narrative Generator - `NarrativeGenerator` backed by the
//! Anthropic Messages API.
//!
//! The connection summary is sent as JSON; the model is asked to answer with
//! a JSON object holding `title`, `description` and `explanation`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicNarrativeConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let generator = AnthropicNarrativeGenerator::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::connections::{ConnectionSummary, Narrative};
use crate::ports::{NarrativeError, NarrativeGenerator};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You write short, friendly insights about correlations found in a \
person's own life data. You receive one relationship as JSON statistics. Respond with a single \
JSON object with string fields \"title\" (at most 8 words), \"description\" (one sentence in \
second person) and \"explanation\" (two or three sentences on what the numbers mean). Never claim \
causation; if survivesConfounderControl is false, mention that the link may be explained by the \
confounder note. Output only the JSON object.";

/// Configuration for the Anthropic narrative generator.
#[derive(Debug, Clone)]
pub struct AnthropicNarrativeConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub max_tokens: u32,
    /// Retries on transient failures.
    pub max_retries: u32,
}

impl AnthropicNarrativeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(10),
            max_tokens: 400,
            max_retries: 1,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

pub struct AnthropicNarrativeGenerator {
    config: AnthropicNarrativeConfig,
    client: Client,
}

impl AnthropicNarrativeGenerator {
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(config: AnthropicNarrativeConfig) -> Result<Self, NarrativeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NarrativeError::unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn to_anthropic_request(&self, summary: &ConnectionSummary) -> Result<AnthropicRequest, NarrativeError> {
        let statistics = serde_json::to_string_pretty(summary)
            .map_err(|e| NarrativeError::parse(format!("Failed to encode summary: {}", e)))?;

        Ok(AnthropicRequest {
            model: self.config.model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: statistics,
            }],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: Some(0.4),
        })
    }

    async fn send_request(&self, summary: &ConnectionSummary) -> Result<Response, NarrativeError> {
        let request = self.to_anthropic_request(summary)?;

        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarrativeError::timeout(self.config.timeout.as_secs())
                } else if e.is_connect() {
                    NarrativeError::unavailable(format!("Connection failed: {}", e))
                } else {
                    NarrativeError::unavailable(e.to_string())
                }
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, NarrativeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(NarrativeError::AuthenticationFailed),
            429 => Err(NarrativeError::rate_limited(parse_retry_after(&error_body))),
            _ => Err(NarrativeError::unavailable(format!(
                "Status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<Narrative, NarrativeError> {
        let response = self.handle_response_status(response).await?;

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::parse(format!("Failed to parse response: {}", e)))?;

        let text = anthropic_response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        parse_narrative(&text)
    }
}

#[async_trait]
impl NarrativeGenerator for AnthropicNarrativeGenerator {
    async fn generate_narrative(
        &self,
        summary: &ConnectionSummary,
    ) -> Result<Narrative, NarrativeError> {
        let mut retry_count = 0;

        loop {
            let outcome = match self.send_request(summary).await {
                Ok(response) => self.parse_response(response).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(narrative) => return Ok(narrative),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    sleep(Duration::from_secs(1 << retry_count)).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Extracts the narrative JSON object from model text, tolerating code
/// fences and leading prose.
fn parse_narrative(text: &str) -> Result<Narrative, NarrativeError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(NarrativeError::parse("No JSON object in response")),
    };

    let narrative: Narrative = serde_json::from_str(json)
        .map_err(|e| NarrativeError::parse(format!("Invalid narrative JSON: {}", e)))?;

    if narrative.title.trim().is_empty() {
        return Err(NarrativeError::parse("Narrative title is empty"));
    }
    Ok(narrative)
}

/// Reads "try again in Ns" from an error body; 60 seconds otherwise.
fn parse_retry_after(error_body: &str) -> u32 {
    let message = serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });

    message
        .as_deref()
        .and_then(|s| s.find("try again in ").map(|idx| &s[idx + 13..]))
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
        .unwrap_or(60)
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}
