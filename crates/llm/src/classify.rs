//! Prompt construction and response parsing for the classify stage.

use crate::client::LlmClient;
use harvestline_core::domain::{Category, Classification};
use harvestline_core::error::{Error, Result};
use serde::Deserialize;

/// Raw shape of the LLM's JSON response, before category coercion.
#[derive(Debug, Deserialize)]
struct RawClassification {
    is_library: bool,
    category: String,
    confidence: f64,
    reason: String,
}

fn build_prompt(readme: &str) -> String {
    format!(
        "Is this a reusable library/package or an end-user application?\n\n\
         README:\n{readme}\n\n\
         Answer in JSON:\n\
         {{\n  \
         \"is_library\": true/false,\n  \
         \"category\": \"web_framework|data_science|ml_ai|cli|testing|database|http|devtools|auth|messaging|cloud|ui|validation|logging|networking|other\",\n  \
         \"confidence\": 0.0-1.0,\n  \
         \"reason\": \"brief explanation\"\n\
         }}"
    )
}

/// Classifies a repository from its README, truncated to `max_chars`.
pub async fn classify_readme(
    client: &LlmClient,
    readme: &str,
    max_chars: usize,
) -> Result<Classification> {
    let truncated: String = readme.chars().take(max_chars).collect();
    let prompt = build_prompt(&truncated);

    let response = client.generate(&prompt).await?;

    parse_classification(&response)
}

/// Parses the LLM's raw JSON response into a [`Classification`], coercing
/// any category name the closed enum doesn't recognize to `Category::Other`
/// rather than failing the whole job over a model naming drift.
fn parse_classification(response: &str) -> Result<Classification> {
    let raw: RawClassification = serde_json::from_str(response)
        .map_err(|e| Error::llm(format!("LLM response did not parse as JSON: {e} ({response})")))?;

    Ok(Classification {
        is_library: raw.is_library,
        category: Category::coerce(&raw.category),
        confidence: raw.confidence.clamp(0.0, 1.0),
        reason: raw.reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_readme_content() {
        let prompt = build_prompt("A fast HTTP client for Rust.");
        assert!(prompt.contains("A fast HTTP client for Rust."));
        assert!(prompt.contains("is_library"));
    }

    #[test]
    fn malformed_json_response_is_a_classification_error() {
        let err = parse_classification("not json").expect_err("should fail to parse");
        assert!(matches!(err, Error::Llm(_)), "expected Error::Llm, got {err:?}");
    }

    #[test]
    fn unrecognized_category_is_coerced_to_other() {
        let response = serde_json::json!({
            "is_library": true,
            "category": "quantum_computing",
            "confidence": 0.8,
            "reason": "a made-up category the model invented"
        })
        .to_string();

        let classification = parse_classification(&response).expect("should parse");
        assert_eq!(classification.category, Category::Other);
    }

    #[test]
    fn confidence_outside_unit_range_is_clamped() {
        let response = serde_json::json!({
            "is_library": false,
            "category": "cli",
            "confidence": 1.4,
            "reason": "overconfident model"
        })
        .to_string();

        let classification = parse_classification(&response).expect("should parse");
        assert_eq!(classification.confidence, 1.0);
    }
}
