//! Categorization prompt and model reply parsing.
//!
//! Shared by every model-backed classifier (remote API and local model) so
//! they agree on one JSON contract:
//!
//! ```json
//! {"category": "project|area|resource|archive", "reasoning": "...", "confidence": 0.0}
//! ```

use serde_json::{Map, Value};
use tracing::trace;

use parable_core::defaults::{REPLY_DEFAULT_CONFIDENCE, REPLY_DEFAULT_REASONING};
use parable_core::{Category, ClassificationResult, Error, Result};

/// Definition and two sample notes for a primary category.
fn category_guidance(category: Category) -> (&'static str, [&'static str; 2]) {
    match category {
        Category::Project => (
            "Short-term effort with a specific outcome and a deadline.",
            ["Finish website redesign by Friday", "Prepare Q4 presentation"],
        ),
        Category::Area => (
            "Ongoing responsibility that needs regular upkeep, with no end date.",
            ["Weekly health check-in", "Monthly budget review"],
        ),
        Category::Resource => (
            "Reference material, a topic of interest, or knowledge worth keeping.",
            ["Great article about Rust async", "Useful cooking technique"],
        ),
        Category::Archive => (
            "Completed, inactive, or no longer relevant item.",
            ["Finished the marketing campaign", "Old project notes"],
        ),
        Category::Uncategorized => ("", ["", ""]),
    }
}

/// Build the categorization prompt for a note.
///
/// Lists every primary category with a definition and examples, demands a
/// JSON-only reply, and embeds the note in triple quotes.
pub fn build_categorization_prompt(content: &str) -> String {
    let mut categories = String::new();
    for category in Category::PRIMARY {
        let (definition, [first, second]) = category_guidance(category);
        categories.push_str(&format!(
            "- {}: {} Examples: \"{}\", \"{}\"\n",
            category.as_str(),
            definition,
            first,
            second
        ));
    }

    format!(
        r#"Categorize the following note using the PARA method. The categories are:

{}
Respond ONLY with a valid JSON object in exactly this format, with no other text:
{{
    "category": "<project|area|resource|archive>",
    "reasoning": "<one sentence explaining the choice>",
    "confidence": <number from 0.0 to 1.0>
}}

Note content:
"""{}"""
"#,
        categories, content
    )
}

/// Strip a markdown code fence wrapped around a reply.
///
/// When the trimmed text starts with a triple backtick, the first and last
/// lines are dropped and the rest rejoined. Anything else is returned
/// trimmed.
pub fn extract_json(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n").trim().to_string()
}

/// Parse a model reply into a [`ClassificationResult`].
///
/// - Reply that is not a JSON object: `Error::Unknown`.
/// - Missing or non-string `category`: `Error::Unknown`.
/// - Unrecognised category label: [`Category::Uncategorized`].
/// - Missing `reasoning`: placeholder text.
/// - Missing or non-numeric `confidence`: 0.5.
/// - Confidence always clamped to [0, 1].
pub fn parse_categorization_reply(text: &str) -> Result<ClassificationResult> {
    let cleaned = extract_json(text);
    trace!(response_len = cleaned.len(), "Parsing categorization reply");

    let value: Value = serde_json::from_str(&cleaned)?;
    let object: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| Error::Unknown("Invalid JSON structure: expected an object".to_string()))?;

    let label = object
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Unknown("missing 'category' field".to_string()))?;

    let category = Category::from_label(label).unwrap_or(Category::Uncategorized);

    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or(REPLY_DEFAULT_REASONING);

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(REPLY_DEFAULT_CONFIDENCE);

    Ok(ClassificationResult::new(category, reasoning, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_primary_categories_and_note() {
        let prompt = build_categorization_prompt("Buy groceries");
        for category in Category::PRIMARY {
            assert!(prompt.contains(&format!("- {}:", category.as_str())));
        }
        assert!(!prompt.contains("uncategorized"));
        assert!(prompt.contains("\"\"\"Buy groceries\"\"\""));
        assert!(prompt.contains("Respond ONLY with a valid JSON object"));
        assert!(prompt.contains("\"confidence\""));
    }

    #[test]
    fn test_parse_plain_reply() {
        let reply = r#"{"category": "project", "reasoning": "Has a deadline", "confidence": 0.92}"#;
        let result = parse_categorization_reply(reply).unwrap();
        assert_eq!(
            result,
            ClassificationResult::new(Category::Project, "Has a deadline", 0.92)
        );
    }

    #[test]
    fn test_fenced_reply_parses_like_plain() {
        let plain = r#"{"category": "area", "reasoning": "ongoing", "confidence": 0.85}"#;
        let fenced = format!("```json\n{}\n```", plain);
        let bare_fence = format!("```\n{}\n```", plain);

        let expected = parse_categorization_reply(plain).unwrap();
        assert_eq!(parse_categorization_reply(&fenced).unwrap(), expected);
        assert_eq!(parse_categorization_reply(&bare_fence).unwrap(), expected);
    }

    #[test]
    fn test_confidence_clamped_high_and_low() {
        let high = parse_categorization_reply(
            r#"{"category": "project", "reasoning": "r", "confidence": 1.5}"#,
        )
        .unwrap();
        assert!(high.confidence <= 1.0);

        let low = parse_categorization_reply(
            r#"{"category": "project", "reasoning": "r", "confidence": -0.3}"#,
        )
        .unwrap();
        assert!(low.confidence >= 0.0);
    }

    #[test]
    fn test_unknown_category_maps_to_uncategorized() {
        let result = parse_categorization_reply(
            r#"{"category": "invalid_category", "reasoning": "?", "confidence": 0.6}"#,
        )
        .unwrap();
        assert_eq!(result.category, Category::Uncategorized);
    }

    #[test]
    fn test_category_label_case_insensitive() {
        let result =
            parse_categorization_reply(r#"{"category": "Resource", "confidence": 0.7}"#).unwrap();
        assert_eq!(result.category, Category::Resource);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let result = parse_categorization_reply(r#"{"category": "archive"}"#).unwrap();
        assert_eq!(result.category, Category::Archive);
        assert_eq!(result.reasoning, REPLY_DEFAULT_REASONING);
        assert!((result.confidence - REPLY_DEFAULT_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_non_numeric_confidence_defaults() {
        let result =
            parse_categorization_reply(r#"{"category": "area", "confidence": "high"}"#).unwrap();
        assert!((result.confidence - REPLY_DEFAULT_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_integer_confidence_accepted() {
        let result =
            parse_categorization_reply(r#"{"category": "area", "confidence": 1}"#).unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_missing_category_is_error() {
        let err = parse_categorization_reply(r#"{"reasoning": "no category"}"#).unwrap_err();
        match err {
            Error::Unknown(msg) => assert!(msg.contains("category")),
            other => panic!("Expected Unknown error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_is_error() {
        assert!(matches!(
            parse_categorization_reply("[1, 2, 3]"),
            Err(Error::Unknown(_))
        ));
        assert!(matches!(
            parse_categorization_reply("not json at all"),
            Err(Error::Unknown(_))
        ));
    }

    #[test]
    fn test_extract_json_passthrough() {
        assert_eq!(extract_json("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(extract_json("```"), "");
    }
}
