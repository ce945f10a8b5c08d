//! Remote categorization backend over the Anthropic Messages API.
//!
//! # Example
//!
//! ```rust,no_run
//! use parable_inference::anthropic::{AnthropicBackend, AnthropicConfig};
//! use parable_core::CategorizationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = AnthropicBackend::new(AnthropicConfig {
//!         api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//!     if backend.is_available() {
//!         let result = backend.categorize("Prepare Q4 presentation").await.unwrap();
//!         println!("{} ({:.2})", result.category, result.confidence);
//!     }
//! }
//! ```

mod backend;
pub mod error;
pub mod types;

pub use backend::{AnthropicBackend, AnthropicConfig};
pub use error::{parse_retry_after, status_to_error};
