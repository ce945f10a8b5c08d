//! Anthropic Messages API categorization backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use parable_core::defaults::{
    ANTHROPIC_MESSAGES_PATH, ANTHROPIC_URL, ANTHROPIC_VERSION, REMOTE_MAX_TOKENS, REMOTE_MODEL,
    TIMEOUT_SECS,
};
use parable_core::{
    Availability, CategorizationBackend, ClassificationResult, Error, Result,
    UnavailabilityReason,
};

use super::error::status_to_error;
use super::types::*;
use crate::prompt::{build_categorization_prompt, parse_categorization_reply};

/// Configuration for the Anthropic backend.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// Base URL, without the `/v1/messages` path.
    pub base_url: String,
    /// API key. Empty means "not configured".
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Transport-level request timeout.
    pub timeout: Duration,
    /// Output token budget.
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: ANTHROPIC_URL.to_string(),
            api_key: String::new(),
            model: REMOTE_MODEL.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            max_tokens: REMOTE_MAX_TOKENS,
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Remote categorization backend calling the Anthropic Messages API.
pub struct AnthropicBackend {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicBackend {
    /// Create a new backend. The timeout is applied to every request.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            subsystem = "inference",
            component = "anthropic",
            model = %config.model,
            base_url = %config.base_url,
            has_api_key = !config.api_key.is_empty(),
            "Initializing Anthropic backend"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    /// Build an authenticated POST to the messages endpoint.
    fn build_request(&self) -> reqwest::RequestBuilder {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            ANTHROPIC_MESSAGES_PATH
        );
        self.client
            .post(url)
            .header("content-type", "application/json")
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("x-api-key", &self.config.api_key)
    }
}

#[async_trait]
impl CategorizationBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    /// Available iff an API key is configured. Never touches the network.
    fn check_availability(&self) -> Availability {
        if self.config.api_key.trim().is_empty() {
            Availability::Unavailable(UnavailabilityReason::NoApiKey)
        } else {
            Availability::Available
        }
    }

    #[instrument(skip(self, content), fields(subsystem = "inference", component = "anthropic", op = "categorize", model = %self.config.model, content_len = content.len()))]
    async fn categorize(&self, content: &str) -> Result<ClassificationResult> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidContent("Content cannot be empty".to_string()));
        }
        if let Availability::Unavailable(reason) = self.check_availability() {
            return Err(Error::ServiceUnavailable(reason));
        }

        let start = Instant::now();
        let prompt = build_categorization_prompt(trimmed);
        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            messages: vec![Message::user(prompt)],
        };

        let response = self.build_request().json(&request).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let err = status_to_error(status, &body, retry_after.as_deref());
            warn!(status, error = %err, "Anthropic request failed");
            return Err(err);
        }

        let envelope: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Unknown(format!("Unexpected API response format: {}", e)))?;

        let text = envelope
            .first_text()
            .ok_or_else(|| Error::Unknown("Unexpected API response format".to_string()))?;

        let result = parse_categorization_reply(text)?;
        debug!(
            category = %result.category,
            confidence = result.confidence,
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Remote categorization complete"
        );
        Ok(result)
    }
}
