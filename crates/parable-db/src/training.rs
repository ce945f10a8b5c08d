//! Training example repository backed by SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use parable_core::{Category, Error, Result, TrainingExample, TrainingExampleRepository};

use crate::schema::init_schema;

const SELECT_COLUMNS: &str =
    "SELECT id, content, category, reasoning, confidence, user_confirmed, created_at FROM training_example";

/// SQLite implementation of TrainingExampleRepository.
///
/// Every `save` is a single INSERT on the pool, so a successful write is
/// visible to the next fetch on any connection.
#[derive(Clone)]
pub struct SqliteTrainingRepository {
    pool: SqlitePool,
}

impl SqliteTrainingRepository {
    /// Create a new SqliteTrainingRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        init_schema(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_example(row: &SqliteRow) -> Result<TrainingExample> {
    let label: String = row.try_get("category")?;
    let category: Category = label.parse().map_err(Error::Storage)?;
    let id: Uuid = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(TrainingExample {
        id,
        content: row.try_get("content")?,
        category,
        reasoning: row.try_get("reasoning")?,
        confidence: row.try_get("confidence")?,
        user_confirmed: row.try_get("user_confirmed")?,
        created_at,
    })
}

#[async_trait]
impl TrainingExampleRepository for SqliteTrainingRepository {
    #[instrument(skip(self, example), fields(subsystem = "db", component = "training", op = "save", example_id = %example.id))]
    async fn save(&self, example: &TrainingExample) -> Result<()> {
        let sort_key = example.created_at.timestamp_nanos_opt().ok_or_else(|| {
            Error::Storage(format!("created_at out of range: {}", example.created_at))
        })?;

        sqlx::query(
            r#"
            INSERT INTO training_example
                (id, content, category, reasoning, confidence, user_confirmed, created_at, created_at_ns)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(example.id)
        .bind(&example.content)
        .bind(example.category.as_str())
        .bind(&example.reasoning)
        .bind(example.confidence)
        .bind(example.user_confirmed)
        .bind(example.created_at)
        .bind(sort_key)
        .execute(&self.pool)
        .await?;

        debug!(category = %example.category, "Training example saved");
        Ok(())
    }

    async fn fetch_recent(&self, limit: i64) -> Result<Vec<TrainingExample>> {
        let sql = format!(
            "{} ORDER BY created_at_ns DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_example).collect()
    }

    async fn fetch_by_category(&self, category: Category) -> Result<Vec<TrainingExample>> {
        let sql = format!(
            "{} WHERE category = ? ORDER BY created_at_ns DESC, rowid DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_example).collect()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM training_example")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}
