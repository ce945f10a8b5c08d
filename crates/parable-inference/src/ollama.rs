//! Local model served by an Ollama daemon.
//!
//! Plugs into [`crate::local::LocalBackend`] as its [`LocalModel`]. The
//! daemon is expected on the same machine, so note text never leaves it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use parable_core::defaults::{LOCAL_MODEL, LOCAL_PROBE_TIMEOUT_SECS, TIMEOUT_SECS};
use parable_core::{Availability, ClassificationResult, Error, Result, UnavailabilityReason};

use crate::local::LocalModel;
use crate::prompt::{build_categorization_prompt, parse_categorization_reply};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Chat API message for `/api/chat`.
#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the Ollama `/api/chat` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    /// Ollama format enforcement. `"json"` guarantees a JSON reply.
    format: serde_json::Value,
}

/// Response from the Ollama `/api/chat` endpoint.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Response from `/api/tags`.
#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Deserialize)]
struct InstalledModel {
    name: String,
}

/// Whether an installed model name satisfies the configured one.
/// `llama3.2` matches `llama3.2:latest`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || (!wanted.contains(':') && installed.strip_suffix(":latest") == Some(wanted))
}

/// Categorizer backed by a model in a local Ollama daemon.
pub struct OllamaLocalModel {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl OllamaLocalModel {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(LOCAL_PROBE_TIMEOUT_SECS),
        }
    }

    /// Default endpoint and model.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_OLLAMA_URL, LOCAL_MODEL)
    }

    /// Per-request timeout for classification calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LocalModel for OllamaLocalModel {
    fn name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self), fields(subsystem = "inference", component = "ollama", op = "probe", model = %self.model))]
    async fn probe(&self) -> Availability {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                info!(error = %e, "Ollama daemon not reachable");
                return Availability::Unavailable(UnavailabilityReason::DeviceNotSupported);
            }
        };

        if !resp.status().is_success() {
            warn!(status = resp.status().as_u16(), "Ollama model listing failed");
            return Availability::Unavailable(UnavailabilityReason::ModelNotReady);
        }

        let tags: TagsResponse = match resp.json().await {
            Ok(tags) => tags,
            Err(e) => {
                warn!(error = %e, "Ollama model listing unreadable");
                return Availability::Unavailable(UnavailabilityReason::ModelNotReady);
            }
        };

        if tags.models.iter().any(|m| model_matches(&m.name, &self.model)) {
            info!("Local model ready");
            Availability::Available
        } else {
            info!(
                installed = tags.models.len(),
                "Local model not installed in Ollama"
            );
            Availability::Unavailable(UnavailabilityReason::ModelNotReady)
        }
    }

    #[instrument(skip(self, content), fields(subsystem = "inference", component = "ollama", op = "classify", model = %self.model, content_len = content.len()))]
    async fn classify(&self, content: &str) -> Result<ClassificationResult> {
        let start = Instant::now();
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_categorization_prompt(content),
            }],
            stream: false,
            format: serde_json::json!("json"),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Unknown(format!("Failed to parse Ollama response: {}", e)))?;

        let parsed = parse_categorization_reply(&result.message.content)?;
        debug!(
            category = %parsed.category,
            confidence = parsed.confidence,
            response_len = result.message.content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Local model categorization complete"
        );
        Ok(parsed)
    }
}
