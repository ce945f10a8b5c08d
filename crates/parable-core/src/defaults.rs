//! Centralized default constants for parable.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// ORCHESTRATION
// =============================================================================

/// Minimum local confidence accepted without escalating to the remote backend.
pub const CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Advisory per-backend call timeout (seconds).
pub const TIMEOUT_SECS: u64 = 10;

/// Whether remote escalations are captured as training examples.
pub const STORE_TRAINING_EXAMPLES: bool = true;

/// Tolerance used when comparing confidence scores for equality.
pub const CONFIDENCE_EPSILON: f64 = 1e-3;

// =============================================================================
// HEURISTIC (LOCAL) CATEGORIZATION
// =============================================================================

/// Score contributed by each matched keyword.
pub const HEURISTIC_KEYWORD_WEIGHT: f64 = 0.15;

/// Upper bound on any heuristic confidence. Kept below the default threshold
/// so heuristic answers always escalate when a remote backend exists.
pub const HEURISTIC_MAX_CONFIDENCE: f64 = 0.7;

/// Confidence reported when no keyword matched any category.
pub const HEURISTIC_NO_MATCH_CONFIDENCE: f64 = 0.2;

/// Suffix appended to heuristic reasoning strings.
pub const HEURISTIC_REASONING_SUFFIX: &str = "(heuristic-based, on-device AI unavailable)";

/// Reasoning reported when no keyword matched any category.
pub const HEURISTIC_NO_MATCH_REASONING: &str =
    "No strong indicators found for any PARA category. Heuristic analysis only.";

// =============================================================================
// REMOTE (ANTHROPIC) BACKEND
// =============================================================================

/// Base URL of the remote chat-completion API.
pub const ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Path of the messages endpoint, relative to the base URL.
pub const ANTHROPIC_MESSAGES_PATH: &str = "/v1/messages";

/// Value sent in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default remote model identifier.
pub const REMOTE_MODEL: &str = "claude-sonnet-4-20250514";

/// Output token budget for a categorization reply.
pub const REMOTE_MAX_TOKENS: u32 = 256;

/// Confidence assumed when a reply omits the field.
pub const REPLY_DEFAULT_CONFIDENCE: f64 = 0.5;

/// Reasoning assumed when a reply omits the field.
pub const REPLY_DEFAULT_REASONING: &str = "No reasoning provided";

// =============================================================================
// LOCAL MODEL (OLLAMA)
// =============================================================================

/// Default local model served by Ollama.
pub const LOCAL_MODEL: &str = "llama3.2:3b";

/// Timeout for the one-time local model probe (seconds).
pub const LOCAL_PROBE_TIMEOUT_SECS: u64 = 3;

// =============================================================================
// STORAGE
// =============================================================================

/// Default SQLite database URL used by the CLI.
pub const DATABASE_URL: &str = "sqlite://parable.db";

/// Default number of training examples returned by "recent" listings.
pub const TRAINING_RECENT_LIMIT: i64 = 20;

// =============================================================================
// CAPTURE
// =============================================================================

/// Reasoning recorded when a user picks the category by hand.
pub const USER_OVERRIDE_REASONING: &str = "Selected by user";

/// Number of characters of note content shown in debug logs.
pub const LOG_PREVIEW_CHARS: usize = 40;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Path to a TOML configuration file.
pub const ENV_CONFIG: &str = "PARABLE_CONFIG";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "PARABLE_CONFIDENCE_THRESHOLD";
pub const ENV_TIMEOUT_SECS: &str = "PARABLE_TIMEOUT_SECS";
pub const ENV_STORE_TRAINING_EXAMPLES: &str = "PARABLE_STORE_TRAINING_EXAMPLES";
pub const ENV_REMOTE_API_KEY: &str = "PARABLE_REMOTE_API_KEY";
/// Fallback for the remote API key when `PARABLE_REMOTE_API_KEY` is unset.
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_REMOTE_MODEL: &str = "PARABLE_REMOTE_MODEL";
pub const ENV_REMOTE_BASE_URL: &str = "PARABLE_REMOTE_BASE_URL";
pub const ENV_LOCAL_HEURISTIC: &str = "PARABLE_LOCAL_HEURISTIC";
pub const ENV_LOCAL_MODEL_URL: &str = "PARABLE_LOCAL_MODEL_URL";
pub const ENV_LOCAL_MODEL: &str = "PARABLE_LOCAL_MODEL";
pub const ENV_DATABASE_URL: &str = "PARABLE_DATABASE_URL";
