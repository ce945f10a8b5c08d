//! # parable-inference
//!
//! Two-tier note categorization for parable.
//!
//! This crate provides:
//! - Local backend: keyword heuristic, or a pluggable local model
//! - Ollama-served local model (default feature `ollama`)
//! - Remote backend over the Anthropic Messages API
//! - Shared prompt building and reply parsing
//! - Orchestrator with confidence-threshold escalation and training capture
//! - Configuration loading from TOML and environment
//! - Note capture pipeline
//!
//! # Feature Flags
//!
//! - `ollama` (default): Enable the Ollama local model
//! - `mock`: Expose test doubles to downstream crates
//!
//! # Example
//!
//! ```rust,no_run
//! use parable_inference::{CategorizationOrchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OrchestratorConfig::from_env();
//!     let orchestrator = CategorizationOrchestrator::from_config(config, None)
//!         .await
//!         .unwrap();
//!     let outcome = orchestrator
//!         .categorize_with_fallback("Finish quarterly report by Friday")
//!         .await
//!         .unwrap();
//!     println!("{} via {}", outcome.category(), outcome.source);
//! }
//! ```

pub mod anthropic;
pub mod capture;
pub mod config;
pub mod heuristic;
pub mod local;
pub mod orchestrator;
pub mod prompt;

#[cfg(feature = "ollama")]
pub mod ollama;

// Test doubles
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use parable_core::*;

#[cfg(feature = "ollama")]
pub use ollama::OllamaLocalModel;

pub use anthropic::{AnthropicBackend, AnthropicConfig};
pub use capture::{CaptureOutcome, CaptureService};
pub use config::{ConfigError, ConfigResult, LocalConfig, OrchestratorConfig};
pub use heuristic::KeywordHeuristic;
pub use local::{LocalBackend, LocalModel};
pub use orchestrator::CategorizationOrchestrator;
pub use prompt::{build_categorization_prompt, extract_json, parse_categorization_reply};
