//! Data models for parable.

use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{CONFIDENCE_EPSILON, USER_OVERRIDE_REASONING};
use crate::error::Result;

// =============================================================================
// CATEGORY
// =============================================================================

/// PARA category assigned to a note.
///
/// Four primary buckets plus an `Uncategorized` sentinel. The set is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Active short-term effort with a deadline or specific outcome.
    Project,
    /// Ongoing responsibility maintained over time.
    Area,
    /// Reference or knowledge material.
    Resource,
    /// Inactive or completed material.
    Archive,
    /// No category assigned yet.
    #[default]
    Uncategorized,
}

impl Category {
    /// Primary buckets in priority order. Ties during heuristic scoring
    /// resolve to the earliest entry.
    pub const PRIMARY: [Category; 4] = [
        Category::Project,
        Category::Area,
        Category::Resource,
        Category::Archive,
    ];

    /// Every category, sentinel last.
    pub const ALL: [Category; 5] = [
        Category::Project,
        Category::Area,
        Category::Resource,
        Category::Archive,
        Category::Uncategorized,
    ];

    /// Stable wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Project => "project",
            Category::Area => "area",
            Category::Resource => "resource",
            Category::Archive => "archive",
            Category::Uncategorized => "uncategorized",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Project => "Projects",
            Category::Area => "Areas",
            Category::Resource => "Resources",
            Category::Archive => "Archive",
            Category::Uncategorized => "Uncategorized",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Project => "Short-term efforts with a specific goal and deadline",
            Category::Area => "Ongoing responsibilities to maintain over time",
            Category::Resource => "Topics of interest and reference material",
            Category::Archive => "Inactive items from the other categories",
            Category::Uncategorized => "Not yet categorized",
        }
    }

    /// Lenient lookup: trims and ignores case. Returns `None` for labels
    /// outside the closed set.
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }

    pub fn is_primary(&self) -> bool {
        !matches!(self, Category::Uncategorized)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

// =============================================================================
// CLASSIFICATION RESULT
// =============================================================================

/// A backend's answer: category, justification, and confidence in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub reasoning: String,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Create a result, clamping confidence to [0, 1]. NaN becomes 0.0.
    pub fn new(category: Category, reasoning: impl Into<String>, confidence: f64) -> Self {
        Self {
            category,
            reasoning: reasoning.into(),
            confidence: clamp_confidence(confidence),
        }
    }

    /// Re-apply the confidence clamp. Used on values that may have been
    /// built by struct literal rather than [`ClassificationResult::new`].
    pub fn clamped(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self
    }

    pub fn meets_threshold(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Category and reasoning compare exactly; confidence within 1e-3.
impl PartialEq for ClassificationResult {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category
            && self.reasoning == other.reasoning
            && (self.confidence - other.confidence).abs() < CONFIDENCE_EPSILON
    }
}

/// Clamp a confidence score into [0, 1]. NaN maps to 0.0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// Where a categorization came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorizationSource {
    /// Local backend (heuristic or local model).
    Local,
    /// Remote LLM API.
    Remote,
    /// Picked by a human.
    UserOverride,
    /// Replayed from an earlier result.
    Cached,
}

impl CategorizationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategorizationSource::Local => "local",
            CategorizationSource::Remote => "remote",
            CategorizationSource::UserOverride => "user_override",
            CategorizationSource::Cached => "cached",
        }
    }
}

impl std::fmt::Display for CategorizationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Orchestrator result: a classification plus provenance and elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedOutcome {
    pub result: ClassificationResult,
    pub source: CategorizationSource,
    /// Wall-clock duration of the whole orchestrator call.
    pub processing_time: Duration,
}

impl CategorizedOutcome {
    pub fn new(
        result: ClassificationResult,
        source: CategorizationSource,
        processing_time: Duration,
    ) -> Self {
        Self {
            result,
            source,
            processing_time,
        }
    }

    /// Outcome for a category chosen by hand.
    pub fn user_override(category: Category) -> Self {
        Self {
            result: ClassificationResult::new(category, USER_OVERRIDE_REASONING, 1.0),
            source: CategorizationSource::UserOverride,
            processing_time: Duration::ZERO,
        }
    }

    pub fn category(&self) -> Category {
        self.result.category
    }

    pub fn confidence(&self) -> f64 {
        self.result.confidence
    }
}

// =============================================================================
// AVAILABILITY
// =============================================================================

/// Why a backend (or the orchestrator) cannot categorize right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailabilityReason {
    /// No local model runtime is reachable on this machine.
    DeviceNotSupported,
    /// The local runtime is present but too old to serve the model.
    OsVersionTooLow,
    /// No local model configured and heuristic fallback switched off.
    LocalModelDisabled,
    /// Local runtime is up but the model is not installed or still loading.
    ModelNotReady,
    /// Remote backend has no API key.
    NoApiKey,
    /// No usable backend; remote path unreachable.
    NoNetwork,
}

impl UnavailabilityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnavailabilityReason::DeviceNotSupported => "device_not_supported",
            UnavailabilityReason::OsVersionTooLow => "os_version_too_low",
            UnavailabilityReason::LocalModelDisabled => "local_model_disabled",
            UnavailabilityReason::ModelNotReady => "model_not_ready",
            UnavailabilityReason::NoApiKey => "no_api_key",
            UnavailabilityReason::NoNetwork => "no_network",
        }
    }

    /// Human-readable explanation suitable for a status line.
    pub fn message(&self) -> &'static str {
        match self {
            UnavailabilityReason::DeviceNotSupported => {
                "This device does not support on-device categorization"
            }
            UnavailabilityReason::OsVersionTooLow => {
                "The local model runtime is too old for on-device categorization"
            }
            UnavailabilityReason::LocalModelDisabled => {
                "On-device categorization is turned off"
            }
            UnavailabilityReason::ModelNotReady => "The on-device model is not ready yet",
            UnavailabilityReason::NoApiKey => "Remote categorization needs an API key",
            UnavailabilityReason::NoNetwork => "No categorization backend is reachable",
        }
    }
}

impl std::fmt::Display for UnavailabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Availability report from a backend or the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Unavailable(UnavailabilityReason),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(&self) -> Option<UnavailabilityReason> {
        match self {
            Availability::Available => None,
            Availability::Unavailable(r) => Some(*r),
        }
    }
}

// =============================================================================
// TRAINING EXAMPLES
// =============================================================================

/// Record captured when the remote backend resolves an escalated note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub id: Uuid,
    pub content: String,
    pub category: Category,
    pub reasoning: String,
    pub confidence: f64,
    /// Set when a human later confirms the category.
    pub user_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl TrainingExample {
    pub fn new(
        content: impl Into<String>,
        category: Category,
        reasoning: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            category,
            reasoning: reasoning.into(),
            confidence: clamp_confidence(confidence),
            user_confirmed: false,
            created_at: Utc::now(),
        }
    }

    /// Unconfirmed example built from a backend result.
    pub fn from_result(content: impl Into<String>, result: &ClassificationResult) -> Self {
        Self::new(
            content,
            result.category,
            result.reasoning.clone(),
            result.confidence,
        )
    }
}

// =============================================================================
// NOTES (capture collaborator)
// =============================================================================

/// How a note was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSourceType {
    Voice,
    #[default]
    Text,
}

impl std::fmt::Display for NoteSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteSourceType::Voice => write!(f, "voice"),
            NoteSourceType::Text => write!(f, "text"),
        }
    }
}

/// A captured note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub source_type: NoteSourceType,
    pub category: Category,
    pub category_confidence: Option<f64>,
    pub category_reasoning: Option<String>,
    pub was_remote_categorized: bool,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Note {
    /// New uncategorized note.
    pub fn new(content: impl Into<String>, source_type: NoteSourceType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            source_type,
            category: Category::Uncategorized,
            category_confidence: None,
            category_reasoning: None,
            was_remote_categorized: false,
            is_pinned: false,
            created_at: now,
            modified_at: now,
        }
    }

    /// Copy an orchestrator outcome onto the note and bump `modified_at`.
    pub fn apply_categorization(&mut self, outcome: &CategorizedOutcome) {
        self.category = outcome.result.category;
        self.category_confidence = Some(outcome.result.confidence);
        self.category_reasoning = Some(outcome.result.reasoning.clone());
        self.was_remote_categorized = outcome.source == CategorizationSource::Remote;
        self.modified_at = Utc::now();
    }

    pub fn is_categorized(&self) -> bool {
        self.category.is_primary()
    }
}

/// Sort order for note listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    RecentlyModified,
}

/// Filter for note listings. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteFilter {
    pub category: Option<Category>,
    pub source_type: Option<NoteSourceType>,
    pub pinned_only: bool,
    pub sort: NoteSortOrder,
    pub limit: Option<i64>,
}

impl NoteFilter {
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned_only = true;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a note passes the filter's predicates (sort and limit are
    /// applied by the store).
    pub fn matches(&self, note: &Note) -> bool {
        self.category.map_or(true, |c| note.category == c)
            && self.source_type.map_or(true, |s| note.source_type == s)
            && (!self.pinned_only || note.is_pinned)
    }
}

// =============================================================================
// TRANSCRIPTION (capture collaborator)
// =============================================================================

/// One incremental update from a transcription source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSegment {
    /// Full transcript so far (not a delta).
    pub text: String,
    pub is_final: bool,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptionSegment {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn final_text(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            is_final: true,
            confidence,
            timestamp: Utc::now(),
        }
    }
}

/// Stream of transcription updates.
pub type TranscriptStream = Pin<Box<dyn Stream<Item = Result<TranscriptionSegment>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_roundtrip() {
        for c in Category::ALL {
            assert_eq!(Category::from_label(c.as_str()), Some(c));
            assert_eq!(c.to_string().parse::<Category>().unwrap(), c);
        }
    }

    #[test]
    fn test_category_from_label_lenient() {
        assert_eq!(Category::from_label("  Project "), Some(Category::Project));
        assert_eq!(Category::from_label("AREA"), Some(Category::Area));
        assert_eq!(Category::from_label("invalid_category"), None);
        assert!("projects".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Resource).unwrap();
        assert_eq!(json, "\"resource\"");
        let back: Category = serde_json::from_str("\"archive\"").unwrap();
        assert_eq!(back, Category::Archive);
    }

    #[test]
    fn test_category_primary_order() {
        assert_eq!(Category::PRIMARY[0], Category::Project);
        assert!(!Category::PRIMARY.contains(&Category::Uncategorized));
        assert!(!Category::Uncategorized.is_primary());
    }

    #[test]
    fn test_classification_result_clamps() {
        assert_eq!(ClassificationResult::new(Category::Area, "r", 1.5).confidence, 1.0);
        assert_eq!(ClassificationResult::new(Category::Area, "r", -0.3).confidence, 0.0);
        assert_eq!(ClassificationResult::new(Category::Area, "r", f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_classification_result_clamped_literal() {
        let raw = ClassificationResult {
            category: Category::Project,
            reasoning: "r".into(),
            confidence: 7.0,
        };
        assert_eq!(raw.clamped().confidence, 1.0);
    }

    #[test]
    fn test_classification_result_equality_epsilon() {
        let a = ClassificationResult::new(Category::Project, "deadline", 0.9);
        let b = ClassificationResult::new(Category::Project, "deadline", 0.9004);
        let c = ClassificationResult::new(Category::Project, "deadline", 0.91);
        let d = ClassificationResult::new(Category::Project, "Deadline", 0.9);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_meets_threshold_inclusive() {
        let r = ClassificationResult::new(Category::Project, "r", 0.8);
        assert!(r.meets_threshold(0.8));
        assert!(!r.meets_threshold(0.81));
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(CategorizationSource::Local.as_str(), "local");
        assert_eq!(CategorizationSource::UserOverride.to_string(), "user_override");
        assert_eq!(
            serde_json::to_string(&CategorizationSource::Remote).unwrap(),
            "\"remote\""
        );
    }

    #[test]
    fn test_availability_helpers() {
        assert!(Availability::Available.is_available());
        assert_eq!(Availability::Available.reason(), None);
        let down = Availability::Unavailable(UnavailabilityReason::ModelNotReady);
        assert!(!down.is_available());
        assert_eq!(down.reason(), Some(UnavailabilityReason::ModelNotReady));
    }

    #[test]
    fn test_training_example_from_result() {
        let result = ClassificationResult::new(Category::Area, "ongoing", 0.91);
        let ex = TrainingExample::from_result("Weekly review", &result);
        assert_eq!(ex.content, "Weekly review");
        assert_eq!(ex.category, Category::Area);
        assert_eq!(ex.reasoning, "ongoing");
        assert!(!ex.user_confirmed);
    }

    #[test]
    fn test_note_apply_categorization() {
        let mut note = Note::new("Finish report by Friday", NoteSourceType::Text);
        assert!(!note.is_categorized());

        let outcome = CategorizedOutcome::new(
            ClassificationResult::new(Category::Project, "deadline", 0.92),
            CategorizationSource::Remote,
            Duration::from_millis(5),
        );
        note.apply_categorization(&outcome);

        assert_eq!(note.category, Category::Project);
        assert_eq!(note.category_confidence, Some(0.92));
        assert!(note.was_remote_categorized);
        assert!(note.modified_at >= note.created_at);
    }

    #[test]
    fn test_user_override_outcome() {
        let outcome = CategorizedOutcome::user_override(Category::Archive);
        assert_eq!(outcome.source, CategorizationSource::UserOverride);
        assert_eq!(outcome.confidence(), 1.0);
        assert_eq!(outcome.result.reasoning, USER_OVERRIDE_REASONING);
    }

    #[test]
    fn test_note_filter_matches() {
        let mut note = Note::new("x", NoteSourceType::Voice);
        note.category = Category::Area;

        assert!(NoteFilter::default().matches(&note));
        assert!(NoteFilter::default().with_category(Category::Area).matches(&note));
        assert!(!NoteFilter::default().with_category(Category::Project).matches(&note));
        assert!(!NoteFilter::default().pinned().matches(&note));

        note.is_pinned = true;
        assert!(NoteFilter::default().pinned().matches(&note));
    }
}
