//! # parable-core
//!
//! Core types, traits, and abstractions for the parable note categorizer.
//!
//! This crate provides the foundational data structures (PARA categories,
//! classification results, training examples, notes) and the trait seams
//! that the inference and storage crates implement.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
