//! Two-tier categorization with confidence-threshold escalation.
//!
//! The local backend is always tried first when it is available. Its answer
//! is accepted when the confidence reaches the configured threshold;
//! otherwise (low confidence, error, or unavailable) the note escalates to
//! the remote backend. Remote failures are returned to the caller. Each
//! remote answer can be recorded as a training example.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use parable_core::logging::preview;
use parable_core::{
    Availability, CategorizationBackend, CategorizationSource, CategorizedOutcome,
    ClassificationResult, Error, Result, TrainingExample, TrainingExampleRepository,
    UnavailabilityReason,
};

use crate::anthropic::AnthropicBackend;
use crate::config::OrchestratorConfig;
use crate::local::{LocalBackend, LocalModel};

/// Why a local answer was not used.
#[derive(Debug)]
enum LocalDecline {
    Unavailable(UnavailabilityReason),
    LowConfidence(ClassificationResult),
    Failed(Error),
}

/// Outcome of the local step.
#[derive(Debug)]
enum LocalAttempt {
    Accepted(ClassificationResult),
    Declined(LocalDecline),
}

/// Routes notes between a local and a remote categorization backend.
///
/// Holds no mutable state: concurrent calls are independent.
pub struct CategorizationOrchestrator {
    local: Arc<dyn CategorizationBackend>,
    remote: Arc<dyn CategorizationBackend>,
    training: Option<Arc<dyn TrainingExampleRepository>>,
    config: OrchestratorConfig,
}

impl CategorizationOrchestrator {
    pub fn new(
        local: Arc<dyn CategorizationBackend>,
        remote: Arc<dyn CategorizationBackend>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            local,
            remote,
            training: None,
            config,
        }
    }

    /// Store used for training examples captured on escalation.
    pub fn with_training_repository(mut self, repo: Arc<dyn TrainingExampleRepository>) -> Self {
        self.training = Some(repo);
        self
    }

    /// Wire the production backends from configuration.
    ///
    /// The local model (if configured) is probed once here.
    pub async fn from_config(
        config: OrchestratorConfig,
        training: Option<Arc<dyn TrainingExampleRepository>>,
    ) -> Result<Self> {
        config.validate()?;

        let local = LocalBackend::detect(
            Self::local_model(&config),
            config.local.heuristic_fallback,
        )
        .await;
        let remote = AnthropicBackend::new(config.anthropic_config())?;

        info!(
            subsystem = "inference",
            component = "orchestrator",
            op = "init",
            local = local.name(),
            local_available = local.is_available(),
            remote_available = remote.is_available(),
            threshold = config.confidence_threshold,
            store_training_examples = config.store_training_examples,
            "Categorization orchestrator ready"
        );

        let mut orchestrator = Self::new(Arc::new(local), Arc::new(remote), config);
        orchestrator.training = training;
        Ok(orchestrator)
    }

    #[cfg(feature = "ollama")]
    fn local_model(config: &OrchestratorConfig) -> Option<Arc<dyn LocalModel>> {
        config.local.model_url.as_ref().map(|url| {
            let model = crate::ollama::OllamaLocalModel::new(url.clone(), config.local.model.clone())
                .with_timeout(config.timeout);
            Arc::new(model) as Arc<dyn LocalModel>
        })
    }

    #[cfg(not(feature = "ollama"))]
    fn local_model(config: &OrchestratorConfig) -> Option<Arc<dyn LocalModel>> {
        if config.local.model_url.is_some() {
            warn!(
                subsystem = "inference",
                component = "orchestrator",
                "local.model_url is set but the ollama feature is disabled"
            );
        }
        None
    }

    /// Minimum local confidence accepted without escalating.
    pub fn confidence_threshold(&self) -> f64 {
        self.config.confidence_threshold
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn local(&self) -> &Arc<dyn CategorizationBackend> {
        &self.local
    }

    pub fn remote(&self) -> &Arc<dyn CategorizationBackend> {
        &self.remote
    }

    /// True iff at least one backend is available.
    pub fn is_available(&self) -> bool {
        self.local.is_available() || self.remote.is_available()
    }

    /// `Available` if either backend is usable, else the local backend's
    /// reason.
    pub fn check_availability(&self) -> Availability {
        match (
            self.local.check_availability(),
            self.remote.check_availability(),
        ) {
            (Availability::Available, _) | (_, Availability::Available) => Availability::Available,
            (Availability::Unavailable(reason), Availability::Unavailable(_)) => {
                Availability::Unavailable(reason)
            }
        }
    }

    /// Categorize and return only the classification.
    pub async fn categorize(&self, content: &str) -> Result<ClassificationResult> {
        Ok(self.categorize_with_fallback(content).await?.result)
    }

    /// Categorize, escalating to the remote backend when the local answer is
    /// missing or below the threshold.
    #[instrument(
        skip(self, content),
        fields(
            subsystem = "inference",
            component = "orchestrator",
            op = "categorize",
            content_len = content.len(),
            threshold = self.config.confidence_threshold,
        )
    )]
    pub async fn categorize_with_fallback(&self, content: &str) -> Result<CategorizedOutcome> {
        let start = Instant::now();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidContent("Content cannot be empty".to_string()));
        }
        debug!(preview = %preview(trimmed), "Categorization requested");

        match self.attempt_local(trimmed).await {
            LocalAttempt::Accepted(result) => {
                let outcome =
                    CategorizedOutcome::new(result, CategorizationSource::Local, start.elapsed());
                info!(
                    source = %outcome.source,
                    category = %outcome.category(),
                    confidence = outcome.confidence(),
                    duration_ms = outcome.processing_time.as_millis() as u64,
                    "Categorized locally"
                );
                return Ok(outcome);
            }
            LocalAttempt::Declined(LocalDecline::Unavailable(reason)) => {
                debug!(reason = %reason.as_str(), "Local backend unavailable, escalating");
            }
            LocalAttempt::Declined(LocalDecline::LowConfidence(result)) => {
                info!(
                    category = %result.category,
                    confidence = result.confidence,
                    "Local confidence below threshold, escalating"
                );
            }
            LocalAttempt::Declined(LocalDecline::Failed(e)) => {
                warn!(error = %e, backend = self.local.name(), "Local categorization failed, escalating");
            }
        }

        if let Availability::Unavailable(reason) = self.remote.check_availability() {
            error!(
                reason = %reason.as_str(),
                "No categorization backend available"
            );
            return Err(Error::ServiceUnavailable(UnavailabilityReason::NoNetwork));
        }

        let result = match self.remote.categorize(trimmed).await {
            Ok(result) => result.clamped(),
            Err(e) => {
                error!(error = %e, backend = self.remote.name(), "Remote categorization failed");
                return Err(e);
            }
        };

        self.record_training_example(trimmed, &result).await;

        let outcome =
            CategorizedOutcome::new(result, CategorizationSource::Remote, start.elapsed());
        info!(
            source = %outcome.source,
            category = %outcome.category(),
            confidence = outcome.confidence(),
            duration_ms = outcome.processing_time.as_millis() as u64,
            "Categorized remotely"
        );
        Ok(outcome)
    }

    async fn attempt_local(&self, content: &str) -> LocalAttempt {
        if let Availability::Unavailable(reason) = self.local.check_availability() {
            return LocalAttempt::Declined(LocalDecline::Unavailable(reason));
        }

        match self.local.categorize(content).await {
            Ok(result) => {
                let result = result.clamped();
                if result.meets_threshold(self.config.confidence_threshold) {
                    LocalAttempt::Accepted(result)
                } else {
                    LocalAttempt::Declined(LocalDecline::LowConfidence(result))
                }
            }
            Err(e) => LocalAttempt::Declined(LocalDecline::Failed(e)),
        }
    }

    /// Best-effort write. Failures are logged and never reach the caller.
    async fn record_training_example(&self, content: &str, result: &ClassificationResult) {
        if !self.config.store_training_examples {
            return;
        }
        let Some(repo) = &self.training else {
            debug!("No training repository configured, example not stored");
            return;
        };

        let example = TrainingExample::from_result(content, result);
        match repo.save(&example).await {
            Ok(()) => debug!(
                example_id = %example.id,
                category = %example.category,
                "Training example stored"
            ),
            Err(e) => warn!(
                example_id = %example.id,
                error = %e,
                "Failed to store training example"
            ),
        }
    }
}
