//! Structured logging schema and field name constants for parable.
//!
//! All crates use these constants for consistent structured logging fields,
//! so a JSON log stream can be filtered by the same keys whichever crate
//! emitted the event.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Caller-visible failure (remote error on the last-resort path) |
//! | WARN  | Recovered failure, fallback applied (local error, training write failed) |
//! | INFO  | Lifecycle events, completed categorizations, escalations |
//! | DEBUG | Decision points, thresholds, content previews |
//! | TRACE | Per-keyword scoring, raw reply sizes |
//!
//! Note content is never logged verbatim. Use [`preview`] for DEBUG output
//! and [`CONTENT_LEN`] everywhere else.

use crate::defaults::LOG_PREVIEW_CHARS;

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "inference", "db", "capture", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "heuristic", "anthropic", "ollama", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "categorize", "check_availability", "probe", "save"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Training example UUID.
pub const EXAMPLE_ID: &str = "example_id";

// ─── Categorization fields ─────────────────────────────────────────────────

/// Which backend produced the answer ("local", "remote", ...).
pub const SOURCE: &str = "source";

/// Assigned category label.
pub const CATEGORY: &str = "category";

/// Confidence reported by a backend, after clamping.
pub const CONFIDENCE: &str = "confidence";

/// Configured escalation threshold.
pub const THRESHOLD: &str = "threshold";

/// Availability reason label when a backend is down.
pub const REASON: &str = "reason";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Character length of note content.
pub const CONTENT_LEN: &str = "content_len";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Transport fields ──────────────────────────────────────────────────────

/// HTTP status code.
pub const STATUS: &str = "status";

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Database table affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Short, single-line preview of note content for DEBUG logs.
///
/// Truncates on a character boundary and collapses newlines.
pub fn preview(content: &str) -> String {
    let mut out: String = content
        .chars()
        .take(LOG_PREVIEW_CHARS)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if content.chars().count() > LOG_PREVIEW_CHARS {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_content_unchanged() {
        assert_eq!(preview("Buy milk"), "Buy milk");
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let long = "a".repeat(LOG_PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert_eq!(p.chars().count(), LOG_PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_preview_collapses_newlines() {
        assert_eq!(preview("line one\nline two"), "line one line two");
    }

    #[test]
    fn test_preview_multibyte_safe() {
        let s = "é".repeat(LOG_PREVIEW_CHARS * 2);
        let p = preview(&s);
        assert!(p.starts_with("éé"));
    }
}
