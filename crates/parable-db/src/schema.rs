//! Schema bootstrap.
//!
//! The store is small enough that idempotent `CREATE ... IF NOT EXISTS`
//! statements replace a migration directory.

use sqlx::SqlitePool;
use tracing::debug;

use parable_core::Result;

/// Table holding captured training examples.
pub const TRAINING_EXAMPLE_TABLE: &str = "training_example";

const TRAINING_EXAMPLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS training_example (
    id              BLOB PRIMARY KEY NOT NULL,
    content         TEXT NOT NULL,
    category        TEXT NOT NULL,
    reasoning       TEXT NOT NULL,
    confidence      REAL NOT NULL,
    user_confirmed  INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    created_at_ns   INTEGER NOT NULL
)
"#;

const TRAINING_EXAMPLE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_training_example_created ON training_example (created_at_ns DESC)",
    "CREATE INDEX IF NOT EXISTS idx_training_example_category ON training_example (category, created_at_ns DESC)",
];

/// Create every table and index if missing.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(TRAINING_EXAMPLE_DDL).execute(pool).await?;
    for ddl in TRAINING_EXAMPLE_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    debug!(
        subsystem = "db",
        component = "schema",
        op = "init",
        db_table = TRAINING_EXAMPLE_TABLE,
        "Schema ready"
    );
    Ok(())
}
