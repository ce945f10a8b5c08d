//! Core traits for parable abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CATEGORIZATION TRAITS
// =============================================================================

/// A classifier that assigns a PARA category to note text.
///
/// Availability checks are local and free: they never touch the network and
/// must return the same answer on repeated calls while backend state is
/// unchanged.
#[async_trait]
pub trait CategorizationBackend: Send + Sync {
    /// Short backend name used in logs ("heuristic", "anthropic", ...).
    fn name(&self) -> &str;

    /// Whether `categorize` can be attempted.
    fn is_available(&self) -> bool {
        self.check_availability().is_available()
    }

    /// Availability with a specific reason when down.
    fn check_availability(&self) -> Availability;

    /// Categorize note text. Empty or whitespace-only input fails with
    /// [`crate::Error::InvalidContent`].
    async fn categorize(&self, content: &str) -> Result<ClassificationResult>;
}

// =============================================================================
// STORAGE TRAITS
// =============================================================================

/// Append-only store of training examples captured on escalation.
///
/// A successful `save` must be visible to subsequent fetches.
#[async_trait]
pub trait TrainingExampleRepository: Send + Sync {
    /// Persist one example.
    async fn save(&self, example: &TrainingExample) -> Result<()>;

    /// Most recent examples first, at most `limit`.
    async fn fetch_recent(&self, limit: i64) -> Result<Vec<TrainingExample>>;

    /// All examples for a category, most recent first.
    async fn fetch_by_category(&self, category: Category) -> Result<Vec<TrainingExample>>;

    /// Total number of stored examples.
    async fn count(&self) -> Result<i64>;
}

/// Note storage used by the capture pipeline.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// List notes matching a filter.
    async fn fetch_all(&self, filter: &NoteFilter) -> Result<Vec<Note>>;

    /// Fetch a note by ID.
    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Note>>;

    /// Insert a new note.
    async fn save(&self, note: &Note) -> Result<()>;

    /// Replace an existing note. Fails with `Storage` if it does not exist.
    async fn update(&self, note: &Note) -> Result<()>;

    /// Delete a note. Deleting a missing note is not an error.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Case-insensitive substring search over content.
    async fn search(&self, query: &str) -> Result<Vec<Note>>;

    /// Note count per category.
    async fn count_by_category(&self) -> Result<HashMap<Category, i64>>;
}

// =============================================================================
// CAPTURE TRAITS
// =============================================================================

/// Streaming speech-to-text source.
#[async_trait]
pub trait TranscriptionSource: Send + Sync {
    /// Begin transcribing. Each item carries the full transcript so far.
    async fn start(&self) -> Result<TranscriptStream>;

    /// Stop transcribing and release the input device.
    async fn stop(&self) -> Result<()>;
}
