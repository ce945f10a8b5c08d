//! Integration tests for the SQLite training example store.

use chrono::{Duration, Utc};
use parable_db::{
    Category, Database, MemoryTrainingRepository, SqliteTrainingRepository, TrainingExample,
    TrainingExampleRepository,
};

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("parable.db").display())
}

#[tokio::test]
async fn test_saved_example_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = database_url(&dir);

    let example = TrainingExample::new(
        "Finished the marketing campaign",
        Category::Archive,
        "completed work",
        0.88,
    );

    {
        let db = Database::connect(&url).await.unwrap();
        db.training.save(&example).await.unwrap();
        db.pool.close().await;
    }

    let db = Database::connect(&url).await.unwrap();
    assert_eq!(db.training.count().await.unwrap(), 1);

    let archived = db.training.fetch_by_category(Category::Archive).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, example.id);
    assert_eq!(archived[0].reasoning, "completed work");
}

async fn assert_ordering(repo: &dyn TrainingExampleRepository) {
    let now = Utc::now();
    let mut oldest = TrainingExample::new("oldest", Category::Project, "r", 0.9);
    oldest.created_at = now - Duration::minutes(5);
    let mut tie_first = TrainingExample::new("tie-first", Category::Area, "r", 0.9);
    tie_first.created_at = now;
    let mut tie_second = TrainingExample::new("tie-second", Category::Project, "r", 0.9);
    tie_second.created_at = now;
    let mut newest = TrainingExample::new("newest", Category::Resource, "r", 0.9);
    newest.created_at = now + Duration::minutes(5);

    // Inserted out of chronological order on purpose.
    repo.save(&newest).await.unwrap();
    repo.save(&oldest).await.unwrap();
    repo.save(&tie_first).await.unwrap();
    repo.save(&tie_second).await.unwrap();

    let recent = repo.fetch_recent(10).await.unwrap();
    let order: Vec<&str> = recent.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(order, vec!["newest", "tie-second", "tie-first", "oldest"]);

    let top_two = repo.fetch_recent(2).await.unwrap();
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[0].content, "newest");

    let projects = repo.fetch_by_category(Category::Project).await.unwrap();
    let order: Vec<&str> = projects.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(order, vec!["tie-second", "oldest"]);

    assert!(repo
        .fetch_by_category(Category::Uncategorized)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(repo.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_sqlite_ordering_newest_first() {
    let db = Database::in_memory().await.unwrap();
    assert_ordering(&db.training).await;
}

#[tokio::test]
async fn test_memory_ordering_matches_sqlite() {
    let repo = MemoryTrainingRepository::new();
    assert_ordering(&repo).await;
}

async fn sub_microsecond_order(repo: &dyn TrainingExampleRepository) -> Vec<String> {
    let base = Utc::now();
    let mut earlier = TrainingExample::new("earlier", Category::Area, "r", 0.9);
    earlier.created_at = base;
    let mut later = TrainingExample::new("later-by-500ns", Category::Area, "r", 0.9);
    later.created_at = base + Duration::nanoseconds(500);

    repo.save(&later).await.unwrap();
    repo.save(&earlier).await.unwrap();

    repo.fetch_recent(10)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.content)
        .collect()
}

#[tokio::test]
async fn test_sub_microsecond_timestamps_order_newest_first() {
    let db = Database::in_memory().await.unwrap();
    let sqlite = sub_microsecond_order(&db.training).await;
    let memory = sub_microsecond_order(&MemoryTrainingRepository::new()).await;

    assert_eq!(sqlite, vec!["later-by-500ns", "earlier"]);
    assert_eq!(sqlite, memory);

    let by_category = db.training.fetch_by_category(Category::Area).await.unwrap();
    assert_eq!(by_category[0].content, "later-by-500ns");
}

#[tokio::test]
async fn test_concurrent_saves_all_visible() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::connect(&database_url(&dir)).await.unwrap();
    let repo: SqliteTrainingRepository = db.training.clone();

    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            let ex = TrainingExample::new(format!("note {}", i), Category::Area, "r", 0.8);
            repo.save(&ex).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(repo.count().await.unwrap(), 8);
    assert_eq!(repo.fetch_recent(100).await.unwrap().len(), 8);
}
