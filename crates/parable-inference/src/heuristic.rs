//! Deterministic keyword-scoring categorizer.
//!
//! Used by the local backend whenever no local model is ready. Scores are
//! capped well below the default escalation threshold so a heuristic answer
//! never passes for a confident model answer.

use tracing::trace;

use parable_core::defaults::{
    HEURISTIC_KEYWORD_WEIGHT, HEURISTIC_MAX_CONFIDENCE, HEURISTIC_NO_MATCH_CONFIDENCE,
    HEURISTIC_NO_MATCH_REASONING, HEURISTIC_REASONING_SUFFIX,
};
use parable_core::{Category, ClassificationResult};

/// Indicator keywords and justification for one category.
struct KeywordRule {
    category: Category,
    keywords: &'static [&'static str],
    justification: &'static str,
}

/// Rules in tie-break priority order.
const RULES: [KeywordRule; 4] = [
    KeywordRule {
        category: Category::Project,
        keywords: &[
            "deadline", "due", "finish", "complete", "deliver", "ship", "launch", "release",
            "by friday", "by monday", "next week", "sprint", "milestone", "goal", "target",
            "project",
        ],
        justification: "Contains project-related keywords indicating a task with a specific outcome",
    },
    KeywordRule {
        category: Category::Area,
        keywords: &[
            "weekly", "daily", "monthly", "routine", "maintain", "ongoing", "review", "health",
            "fitness", "budget", "responsibility", "manage", "oversee", "track",
        ],
        justification: "Contains area-related keywords suggesting an ongoing responsibility",
    },
    KeywordRule {
        category: Category::Resource,
        keywords: &[
            "article", "book", "tutorial", "reference", "learn", "interesting", "read", "watch",
            "course", "tip", "technique", "how to", "guide", "documentation",
        ],
        justification: "Contains resource-related keywords indicating reference material",
    },
    KeywordRule {
        category: Category::Archive,
        keywords: &[
            "completed", "finished", "done", "wrapped up", "closed", "ended", "concluded",
            "archived", "old", "past", "no longer", "discontinued", "cancelled",
        ],
        justification: "Contains archive-related keywords indicating a completed item",
    },
];

/// Keyword-scoring categorizer. Stateless and cheap to copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordHeuristic;

impl KeywordHeuristic {
    pub fn new() -> Self {
        Self
    }

    /// Score of a keyword match count: `min(count * 0.15, 0.7)`.
    pub fn score(matches: usize) -> f64 {
        (matches as f64 * HEURISTIC_KEYWORD_WEIGHT).min(HEURISTIC_MAX_CONFIDENCE)
    }

    /// Per-category scores in priority order.
    pub fn scores(&self, content: &str) -> [(Category, f64); 4] {
        let lowered = content.to_lowercase();
        RULES.map(|rule| {
            let matches = rule
                .keywords
                .iter()
                .filter(|k| lowered.contains(*k))
                .count();
            trace!(category = %rule.category, matches, "Heuristic keyword matches");
            (rule.category, Self::score(matches))
        })
    }

    /// Categorize content. Never fails.
    ///
    /// Highest score wins; equal scores resolve to the earlier category in
    /// project, area, resource, archive order. No match at all yields
    /// `Uncategorized` at low confidence.
    pub fn classify(&self, content: &str) -> ClassificationResult {
        let mut best: Option<(usize, f64)> = None;
        for (idx, (_, score)) in self.scores(content).into_iter().enumerate() {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((idx, score));
            }
        }

        match best {
            Some((idx, score)) if score > 0.0 => {
                let rule = &RULES[idx];
                ClassificationResult::new(
                    rule.category,
                    format!("{} {}", rule.justification, HEURISTIC_REASONING_SUFFIX),
                    score.min(HEURISTIC_MAX_CONFIDENCE),
                )
            }
            _ => ClassificationResult::new(
                Category::Uncategorized,
                HEURISTIC_NO_MATCH_REASONING,
                HEURISTIC_NO_MATCH_CONFIDENCE,
            ),
        }
    }
}
