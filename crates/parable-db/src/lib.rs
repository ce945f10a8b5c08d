//! # parable-db
//!
//! Storage layer for parable.
//!
//! This crate provides:
//! - SQLite connection pool management
//! - Schema bootstrap
//! - A durable training example store (SQLite)
//! - In-memory training example and note stores
//!
//! ## Example
//!
//! ```rust,ignore
//! use parable_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> parable_core::Result<()> {
//!     let db = Database::connect("sqlite://parable.db").await?;
//!     println!("{} examples captured", db.training.count().await?);
//!     Ok(())
//! }
//! ```
pub mod memory;
pub mod pool;
pub mod schema;
pub mod training;

use sqlx::SqlitePool;

pub use memory::{MemoryNoteRepository, MemoryTrainingRepository};
pub use pool::{
    create_memory_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use training::SqliteTrainingRepository;

// Re-export core types
pub use parable_core::*;

/// Database handle bundling the pool and its repositories.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    pub training: SqliteTrainingRepository,
}

impl Database {
    /// Connect, then create the schema if needed.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database with the schema applied.
    pub async fn in_memory() -> Result<Self> {
        let pool = create_memory_pool().await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        schema::init_schema(&pool).await?;
        log_pool_metrics(&pool);
        Ok(Self {
            training: SqliteTrainingRepository::new(pool.clone()),
            pool,
        })
    }
}
