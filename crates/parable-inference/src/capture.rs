//! Note capture pipeline.
//!
//! A note is saved as `Uncategorized` before any categorization runs, so a
//! failed or skipped categorization never loses the note. The category is
//! filled in afterwards, or set by hand with
//! [`CaptureService::apply_user_category`].

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use parable_core::{
    CategorizedOutcome, Category, Error, Note, NoteRepository, NoteSourceType, Result,
    TranscriptionSource,
};

use crate::orchestrator::CategorizationOrchestrator;

/// A saved note and, when categorization succeeded, how it was categorized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub note: Note,
    pub categorization: Option<CategorizedOutcome>,
}

/// Saves notes and enriches them with a category.
pub struct CaptureService {
    notes: Arc<dyn NoteRepository>,
    orchestrator: Option<Arc<CategorizationOrchestrator>>,
}

impl CaptureService {
    /// Capture without categorization. Notes stay `Uncategorized`.
    pub fn new(notes: Arc<dyn NoteRepository>) -> Self {
        Self {
            notes,
            orchestrator: None,
        }
    }

    pub fn with_orchestrator(mut self, orchestrator: Arc<CategorizationOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn notes(&self) -> &Arc<dyn NoteRepository> {
        &self.notes
    }

    /// Save trimmed text as a note, then try to categorize it.
    #[instrument(skip(self, text, source_type), fields(subsystem = "capture", component = "service", op = "capture_text", content_len = text.len(), source_type = %source_type))]
    pub async fn capture_text(
        &self,
        text: &str,
        source_type: NoteSourceType,
    ) -> Result<CaptureOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidContent("Content cannot be empty".to_string()));
        }

        let mut note = Note::new(trimmed, source_type);
        self.notes.save(&note).await?;
        info!(note_id = %note.id, "Note saved");

        let Some(orchestrator) = self.orchestrator.as_ref() else {
            return Ok(CaptureOutcome {
                note,
                categorization: None,
            });
        };

        if !orchestrator.is_available() {
            debug!(note_id = %note.id, "Categorization unavailable, note left uncategorized");
            return Ok(CaptureOutcome {
                note,
                categorization: None,
            });
        }

        match orchestrator.categorize_with_fallback(trimmed).await {
            Ok(outcome) => {
                note.apply_categorization(&outcome);
                self.notes.update(&note).await?;
                info!(
                    note_id = %note.id,
                    category = %outcome.category(),
                    source = %outcome.source,
                    "Note categorized"
                );
                Ok(CaptureOutcome {
                    note,
                    categorization: Some(outcome),
                })
            }
            Err(e) => {
                warn!(note_id = %note.id, error = %e, "Categorization failed, note left uncategorized");
                Ok(CaptureOutcome {
                    note,
                    categorization: None,
                })
            }
        }
    }

    /// Drain a transcription stream and capture the final transcript as a
    /// voice note.
    ///
    /// Reading stops at the first final segment or at stream end. A stream
    /// error before any text arrives is returned; a later error keeps the
    /// text received so far.
    #[instrument(skip(self, source), fields(subsystem = "capture", component = "service", op = "capture_transcription"))]
    pub async fn capture_transcription(
        &self,
        source: &dyn TranscriptionSource,
    ) -> Result<CaptureOutcome> {
        let mut stream = source.start().await?;
        let mut transcript = String::new();
        let mut stream_error = None;

        while let Some(item) = stream.next().await {
            match item {
                Ok(segment) => {
                    transcript = segment.text;
                    if segment.is_final {
                        debug!(confidence = segment.confidence, "Final transcript received");
                        break;
                    }
                }
                Err(e) if transcript.trim().is_empty() => {
                    stream_error = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Transcription interrupted, keeping partial transcript");
                    break;
                }
            }
        }
        drop(stream);

        if let Err(e) = source.stop().await {
            warn!(error = %e, "Failed to stop transcription source");
        }
        if let Some(e) = stream_error {
            return Err(e);
        }

        self.capture_text(&transcript, NoteSourceType::Voice).await
    }

    /// Set a note's category by hand.
    #[instrument(skip(self, note_id, category), fields(subsystem = "capture", component = "service", op = "apply_user_category", note_id = %note_id, category = %category))]
    pub async fn apply_user_category(&self, note_id: Uuid, category: Category) -> Result<Note> {
        let mut note = self
            .notes
            .fetch_by_id(note_id)
            .await?
            .ok_or_else(|| Error::Storage("note not found".to_string()))?;

        note.apply_categorization(&CategorizedOutcome::user_override(category));
        self.notes.update(&note).await?;
        info!("User category applied");
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::mock::MockBackend;
    use async_trait::async_trait;
    use futures::stream;
    use parable_core::{
        CategorizationSource, NoteFilter, TranscriptStream, TranscriptionSegment,
        UnavailabilityReason,
    };
    use parable_db::MemoryNoteRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn orchestrator(local: MockBackend, remote: MockBackend) -> Arc<CategorizationOrchestrator> {
        Arc::new(CategorizationOrchestrator::new(
            Arc::new(local),
            Arc::new(remote),
            OrchestratorConfig::default(),
        ))
    }

    fn remote_down() -> MockBackend {
        MockBackend::new("remote").unavailable(UnavailabilityReason::NoApiKey)
    }

    fn service(notes: &Arc<MemoryNoteRepository>, local: MockBackend) -> CaptureService {
        CaptureService::new(notes.clone()).with_orchestrator(orchestrator(local, remote_down()))
    }

    struct ScriptedSource {
        items: std::sync::Mutex<Option<Vec<Result<TranscriptionSegment>>>>,
        stops: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(items: Vec<Result<TranscriptionSegment>>) -> Self {
            Self {
                items: std::sync::Mutex::new(Some(items)),
                stops: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscriptionSource for ScriptedSource {
        async fn start(&self) -> Result<TranscriptStream> {
            let items = self.items.lock().unwrap().take().unwrap_or_default();
            Ok(Box::pin(stream::iter(items)))
        }

        async fn stop(&self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_capture_text_categorizes_and_updates() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let svc = service(
            &notes,
            MockBackend::new("local").returning(Category::Project, "deadline", 0.9),
        );

        let outcome = svc
            .capture_text("  Ship v2 by Friday ", NoteSourceType::Text)
            .await
            .unwrap();

        assert_eq!(outcome.note.content, "Ship v2 by Friday");
        assert_eq!(outcome.note.category, Category::Project);
        assert_eq!(outcome.note.category_confidence, Some(0.9));
        assert!(!outcome.note.was_remote_categorized);
        assert_eq!(
            outcome.categorization.as_ref().map(|c| c.source),
            Some(CategorizationSource::Local)
        );

        let stored = notes.fetch_by_id(outcome.note.id).await.unwrap().unwrap();
        assert_eq!(stored.category, Category::Project);
    }

    #[tokio::test]
    async fn test_capture_text_rejects_empty() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let svc = service(&notes, MockBackend::new("local"));
        let err = svc.capture_text(" \n ", NoteSourceType::Text).await.unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
        assert!(notes.fetch_all(&NoteFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_categorization_failure_keeps_note() {
        let notes = Arc::new(MemoryNoteRepository::new());
        // Local answer is below threshold and remote is down.
        let svc = service(
            &notes,
            MockBackend::new("local").returning(Category::Area, "maybe", 0.3),
        );

        let outcome = svc.capture_text("Call mom", NoteSourceType::Text).await.unwrap();
        assert!(outcome.categorization.is_none());
        assert_eq!(outcome.note.category, Category::Uncategorized);

        let stored = notes.fetch_by_id(outcome.note.id).await.unwrap().unwrap();
        assert_eq!(stored.category, Category::Uncategorized);
    }

    #[tokio::test]
    async fn test_unavailable_orchestrator_is_skipped() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let local = MockBackend::new("local").unavailable(UnavailabilityReason::ModelNotReady);
        let svc = service(&notes, local.clone());

        let outcome = svc.capture_text("note", NoteSourceType::Text).await.unwrap();
        assert!(outcome.categorization.is_none());
        assert_eq!(local.categorize_call_count(), 0);
    }

    #[tokio::test]
    async fn test_without_orchestrator() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let svc = CaptureService::new(notes.clone());
        let outcome = svc.capture_text("note", NoteSourceType::Voice).await.unwrap();
        assert!(outcome.categorization.is_none());
        assert_eq!(outcome.note.source_type, NoteSourceType::Voice);
    }

    #[tokio::test]
    async fn test_apply_user_category() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let svc = CaptureService::new(notes.clone());
        let captured = svc.capture_text("Tax documents", NoteSourceType::Text).await.unwrap();

        let note = svc
            .apply_user_category(captured.note.id, Category::Archive)
            .await
            .unwrap();
        assert_eq!(note.category, Category::Archive);
        assert_eq!(note.category_confidence, Some(1.0));
        assert_eq!(note.category_reasoning.as_deref(), Some("Selected by user"));
        assert!(!note.was_remote_categorized);

        let stored = notes.fetch_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(stored.category, Category::Archive);
    }

    #[tokio::test]
    async fn test_apply_user_category_missing_note() {
        let svc = CaptureService::new(Arc::new(MemoryNoteRepository::new()));
        let err = svc
            .apply_user_category(Uuid::new_v4(), Category::Area)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(ref m) if m == "note not found"));
    }

    #[tokio::test]
    async fn test_transcription_stops_at_final_segment() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let svc = service(
            &notes,
            MockBackend::new("local").returning(Category::Area, "health", 0.85),
        );
        let source = ScriptedSource::new(vec![
            Ok(TranscriptionSegment::partial("Book")),
            Ok(TranscriptionSegment::partial("Book dentist")),
            Ok(TranscriptionSegment::final_text("Book dentist appointment", 0.93)),
            Ok(TranscriptionSegment::partial("ignored trailing text")),
        ]);

        let outcome = svc.capture_transcription(&source).await.unwrap();
        assert_eq!(outcome.note.content, "Book dentist appointment");
        assert_eq!(outcome.note.source_type, NoteSourceType::Voice);
        assert_eq!(outcome.note.category, Category::Area);
        assert_eq!(source.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transcription_stream_end_uses_latest_text() {
        let notes = Arc::new(MemoryNoteRepository::new());
        let svc = CaptureService::new(notes.clone());
        let source = ScriptedSource::new(vec![
            Ok(TranscriptionSegment::partial("Groceries")),
            Ok(TranscriptionSegment::partial("Groceries list")),
        ]);

        let outcome = svc.capture_transcription(&source).await.unwrap();
        assert_eq!(outcome.note.content, "Groceries list");
    }

    #[tokio::test]
    async fn test_transcription_error_before_text_is_returned() {
        let svc = CaptureService::new(Arc::new(MemoryNoteRepository::new()));
        let source = ScriptedSource::new(vec![Err(Error::Unknown("mic unavailable".into()))]);

        let err = svc.capture_transcription(&source).await.unwrap_err();
        assert!(matches!(err, Error::Unknown(_)));
        assert_eq!(source.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transcription_error_after_text_keeps_partial() {
        let svc = CaptureService::new(Arc::new(MemoryNoteRepository::new()));
        let source = ScriptedSource::new(vec![
            Ok(TranscriptionSegment::partial("Renew passport")),
            Err(Error::Unknown("mic unplugged".into())),
        ]);

        let outcome = svc.capture_transcription(&source).await.unwrap();
        assert_eq!(outcome.note.content, "Renew passport");
    }

    #[tokio::test]
    async fn test_empty_transcription_is_invalid() {
        let svc = CaptureService::new(Arc::new(MemoryNoteRepository::new()));
        let source = ScriptedSource::new(vec![]);
        let err = svc.capture_transcription(&source).await.unwrap_err();
        assert!(matches!(err, Error::InvalidContent(_)));
    }
}
