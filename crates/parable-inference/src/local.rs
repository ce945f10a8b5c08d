//! Local (on-device) categorization backend.
//!
//! Prefers a local language model when one is installed and ready, and
//! degrades to the keyword heuristic otherwise. Availability is probed once
//! at construction and cached for the life of the backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use parable_core::logging::preview;
use parable_core::{
    Availability, CategorizationBackend, ClassificationResult, Error, Result,
    UnavailabilityReason,
};

use crate::heuristic::KeywordHeuristic;

/// A language model running on the local machine.
#[async_trait]
pub trait LocalModel: Send + Sync {
    /// Model name used in logs.
    fn name(&self) -> &str;

    /// Capability check. Called once by [`LocalBackend::detect`].
    async fn probe(&self) -> Availability;

    /// Classify non-empty, trimmed note text.
    async fn classify(&self, content: &str) -> Result<ClassificationResult>;
}

/// Which engine the local backend settled on at construction.
#[derive(Clone)]
enum LocalEngine {
    Model(Arc<dyn LocalModel>),
    Heuristic(KeywordHeuristic),
    Disabled(UnavailabilityReason),
}

/// On-device categorization backend.
#[derive(Clone)]
pub struct LocalBackend {
    engine: LocalEngine,
    /// Why the model is not in use, when it is not.
    model_status: Availability,
}

impl LocalBackend {
    /// Probe the optional model once and pick an engine.
    ///
    /// - Model ready: use it.
    /// - Model absent or not ready, heuristic enabled: use the heuristic.
    /// - Neither: the backend reports unavailable with the model's reason,
    ///   or `LocalModelDisabled` when no model was configured.
    pub async fn detect(model: Option<Arc<dyn LocalModel>>, heuristic_fallback: bool) -> Self {
        let model_status = match &model {
            Some(m) => m.probe().await,
            None => Availability::Unavailable(UnavailabilityReason::LocalModelDisabled),
        };

        let engine = match (model, model_status) {
            (Some(m), Availability::Available) => LocalEngine::Model(m),
            (_, Availability::Unavailable(_)) if heuristic_fallback => {
                LocalEngine::Heuristic(KeywordHeuristic::new())
            }
            (_, Availability::Unavailable(reason)) => LocalEngine::Disabled(reason),
            // Available status is only produced with a model present.
            (None, Availability::Available) => LocalEngine::Heuristic(KeywordHeuristic::new()),
        };

        let backend = Self {
            engine,
            model_status,
        };
        info!(
            subsystem = "inference",
            component = "local",
            op = "detect",
            engine = backend.engine_name(),
            model_status = ?backend.model_status,
            "Local categorization backend ready"
        );
        backend
    }

    /// Heuristic-only backend, no model probe.
    pub fn heuristic() -> Self {
        Self {
            engine: LocalEngine::Heuristic(KeywordHeuristic::new()),
            model_status: Availability::Unavailable(UnavailabilityReason::LocalModelDisabled),
        }
    }

    /// Local backend that never categorizes.
    pub fn disabled(reason: UnavailabilityReason) -> Self {
        Self {
            engine: LocalEngine::Disabled(reason),
            model_status: Availability::Unavailable(reason),
        }
    }

    /// "model", "heuristic", or "disabled".
    pub fn engine_name(&self) -> &'static str {
        match self.engine {
            LocalEngine::Model(_) => "model",
            LocalEngine::Heuristic(_) => "heuristic",
            LocalEngine::Disabled(_) => "disabled",
        }
    }

    /// Result of the one-time model probe, independent of the heuristic.
    pub fn model_status(&self) -> Availability {
        self.model_status
    }

    pub fn uses_model(&self) -> bool {
        matches!(self.engine, LocalEngine::Model(_))
    }
}

#[async_trait]
impl CategorizationBackend for LocalBackend {
    fn name(&self) -> &str {
        match &self.engine {
            LocalEngine::Model(m) => m.name(),
            LocalEngine::Heuristic(_) => "heuristic",
            LocalEngine::Disabled(_) => "local",
        }
    }

    fn check_availability(&self) -> Availability {
        match self.engine {
            LocalEngine::Disabled(reason) => Availability::Unavailable(reason),
            _ => Availability::Available,
        }
    }

    #[instrument(skip(self, content), fields(subsystem = "inference", component = "local", op = "categorize", engine = self.engine_name(), content_len = content.len()))]
    async fn categorize(&self, content: &str) -> Result<ClassificationResult> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidContent("Content cannot be empty".to_string()));
        }
        debug!(preview = %preview(trimmed), "Categorizing locally");

        match &self.engine {
            LocalEngine::Model(model) => Ok(model.classify(trimmed).await?.clamped()),
            LocalEngine::Heuristic(h) => Ok(h.classify(trimmed)),
            LocalEngine::Disabled(reason) => Err(Error::ServiceUnavailable(*reason)),
        }
    }
}
