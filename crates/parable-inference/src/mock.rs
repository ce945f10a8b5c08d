//! Test doubles for deterministic orchestrator tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parable_inference::mock::MockBackend;
//! use parable_inference::{Category, CategorizationBackend};
//!
//! #[tokio::test]
//! async fn test_with_mock_backend() {
//!     let local = MockBackend::new("local").returning(Category::Project, "deadline", 0.92);
//!
//!     let result = local.categorize("Ship v2 by Friday").await.unwrap();
//!     assert_eq!(result.category, Category::Project);
//!     assert_eq!(local.categorize_call_count(), 1);
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use parable_core::{
    Availability, CategorizationBackend, Category, ClassificationResult, Error, Result,
    TrainingExample, TrainingExampleRepository, UnavailabilityReason,
};

type ErrorFactory = Arc<dyn Fn() -> Error + Send + Sync>;

#[derive(Clone)]
enum MockResponse {
    Result(ClassificationResult),
    Error(ErrorFactory),
}

#[derive(Clone)]
struct MockConfig {
    name: String,
    response: MockResponse,
    latency: Duration,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    pub timestamp: Instant,
}

/// Scripted categorization backend that records every call.
#[derive(Clone)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    availability: Arc<Mutex<Availability>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockBackend {
    /// Available backend answering `Uncategorized` at 0.5.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: Arc::new(MockConfig {
                name: name.into(),
                response: MockResponse::Result(ClassificationResult::new(
                    Category::Uncategorized,
                    "Mock response",
                    0.5,
                )),
                latency: Duration::ZERO,
            }),
            availability: Arc::new(Mutex::new(Availability::Available)),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer every call with this result. The confidence is passed through
    /// unclamped so callers can exercise clamping downstream.
    pub fn returning(
        mut self,
        category: Category,
        reasoning: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Arc::make_mut(&mut self.config).response = MockResponse::Result(ClassificationResult {
            category,
            reasoning: reasoning.into(),
            confidence,
        });
        self
    }

    /// Fail every call with the error built by `make_error`.
    pub fn failing(mut self, make_error: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Arc::make_mut(&mut self.config).response = MockResponse::Error(Arc::new(make_error));
        self
    }

    /// Report unavailable with the given reason.
    pub fn unavailable(self, reason: UnavailabilityReason) -> Self {
        self.set_availability(Availability::Unavailable(reason));
        self
    }

    /// Set simulated latency for categorize calls.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency = Duration::from_millis(latency_ms);
        self
    }

    /// Change availability after construction.
    pub fn set_availability(&self, availability: Availability) {
        *self.availability.lock().unwrap() = availability;
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of `categorize` invocations, including rejected ones.
    pub fn categorize_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == "categorize")
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
            timestamp: Instant::now(),
        });
    }
}

#[async_trait]
impl CategorizationBackend for MockBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn check_availability(&self) -> Availability {
        *self.availability.lock().unwrap()
    }

    async fn categorize(&self, content: &str) -> Result<ClassificationResult> {
        self.log_call("categorize", content);

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        if content.trim().is_empty() {
            return Err(Error::InvalidContent("Content cannot be empty".to_string()));
        }

        match &self.config.response {
            MockResponse::Result(result) => Ok(result.clone()),
            MockResponse::Error(make_error) => Err(make_error()),
        }
    }
}

/// In-memory training store that records saves and can be told to fail.
#[derive(Clone, Default)]
pub struct MockTrainingRepository {
    saved: Arc<Mutex<Vec<TrainingExample>>>,
    fail_saves: Arc<AtomicBool>,
}

impl MockTrainingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository whose `save` always fails with a storage error.
    pub fn failing() -> Self {
        let repo = Self::default();
        repo.set_fail_saves(true);
        repo
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Every example saved so far, in save order.
    pub fn saved(&self) -> Vec<TrainingExample> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl TrainingExampleRepository for MockTrainingRepository {
    async fn save(&self, example: &TrainingExample) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Storage("mock save failure".to_string()));
        }
        self.saved.lock().unwrap().push(example.clone());
        Ok(())
    }

    async fn fetch_recent(&self, limit: i64) -> Result<Vec<TrainingExample>> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn fetch_by_category(&self, category: Category) -> Result<Vec<TrainingExample>> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .rev()
            .filter(|e| e.category == category)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.saved.lock().unwrap().len() as i64)
    }
}
