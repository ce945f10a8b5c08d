//! In-memory repositories.
//!
//! Used by tests and by callers that do not need durability. Ordering
//! matches the SQLite store: newest first, ties broken by insertion order.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use parable_core::{
    Category, Error, Note, NoteFilter, NoteRepository, NoteSortOrder, Result, TrainingExample,
    TrainingExampleRepository,
};

/// Newest first; equal timestamps keep the later insertion first.
fn newest_first(items: impl DoubleEndedIterator<Item = TrainingExample>) -> Vec<TrainingExample> {
    let mut out: Vec<TrainingExample> = items.rev().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Training example store held in process memory.
#[derive(Default)]
pub struct MemoryTrainingRepository {
    examples: RwLock<Vec<TrainingExample>>,
}

impl MemoryTrainingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrainingExampleRepository for MemoryTrainingRepository {
    async fn save(&self, example: &TrainingExample) -> Result<()> {
        let mut examples = self.examples.write().await;
        if examples.iter().any(|e| e.id == example.id) {
            return Err(Error::Storage(format!(
                "training example {} already exists",
                example.id
            )));
        }
        examples.push(example.clone());
        Ok(())
    }

    async fn fetch_recent(&self, limit: i64) -> Result<Vec<TrainingExample>> {
        let examples = self.examples.read().await;
        let mut out = newest_first(examples.iter().cloned());
        out.truncate(limit.max(0) as usize);
        Ok(out)
    }

    async fn fetch_by_category(&self, category: Category) -> Result<Vec<TrainingExample>> {
        let examples = self.examples.read().await;
        let matching: Vec<TrainingExample> = examples
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect();
        Ok(newest_first(matching.into_iter()))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.examples.read().await.len() as i64)
    }
}

/// Note store held in process memory.
#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: RwLock<Vec<Note>>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_notes(notes: &mut [Note], order: NoteSortOrder) {
    match order {
        NoteSortOrder::NewestFirst => notes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        NoteSortOrder::OldestFirst => notes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        NoteSortOrder::RecentlyModified => {
            notes.sort_by(|a, b| b.modified_at.cmp(&a.modified_at))
        }
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn fetch_all(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let notes = self.notes.read().await;
        let mut out: Vec<Note> = notes.iter().filter(|n| filter.matches(n)).cloned().collect();
        sort_notes(&mut out, filter.sort);
        if let Some(limit) = filter.limit {
            out.truncate(limit.max(0) as usize);
        }
        Ok(out)
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        let notes = self.notes.read().await;
        Ok(notes.iter().find(|n| n.id == id).cloned())
    }

    async fn save(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes.write().await;
        if notes.iter().any(|n| n.id == note.id) {
            return Err(Error::Storage(format!("note {} already exists", note.id)));
        }
        notes.push(note.clone());
        Ok(())
    }

    async fn update(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes.write().await;
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => {
                *existing = note.clone();
                Ok(())
            }
            None => Err(Error::Storage("note not found".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.notes.write().await.retain(|n| n.id != id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Note>> {
        let needle = query.trim().to_lowercase();
        let notes = self.notes.read().await;
        let mut out: Vec<Note> = notes
            .iter()
            .filter(|n| n.content.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        sort_notes(&mut out, NoteSortOrder::NewestFirst);
        Ok(out)
    }

    async fn count_by_category(&self) -> Result<HashMap<Category, i64>> {
        let notes = self.notes.read().await;
        let mut counts = HashMap::new();
        for note in notes.iter() {
            *counts.entry(note.category).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
