use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{PageAnalysis, PageMetadata};

use super::OllamaClient;

/// Characters of page text included in the prompt.
const CONTENT_BUDGET: usize = 2000;

static JSON_SPAN: OnceLock<Regex> = OnceLock::new();

/// Model output before the required keys are checked.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    categories: Option<Vec<String>>,
    summary: Option<String>,
    topics: Option<Vec<String>>,
}

pub struct Categorizer {
    client: Arc<OllamaClient>,
}

impl Categorizer {
    pub fn new(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }

    pub async fn categorize(&self, content: &str, metadata: &PageMetadata) -> Result<PageAnalysis> {
        tracing::debug!(
            "Categorizing {} chars titled {:?}",
            content.len(),
            metadata.title
        );

        let prompt = build_prompt(content, metadata);
        let response = self.client.generate(&prompt).await?;
        let analysis = parse_analysis(&response)?;

        tracing::info!(
            "Categorized as {:?}, topics {:?}",
            analysis.categories,
            analysis.topics
        );
        Ok(analysis)
    }
}

pub fn build_prompt(content: &str, metadata: &PageMetadata) -> String {
    let content: String = content.chars().take(CONTENT_BUDGET).collect();

    format!(
        r#"<system>You are a precise content analysis assistant. Your task is to analyze content and provide structured categorization in valid JSON format.</system>

<input>
Title: {title}
Description: {description}
Keywords: {keywords}

Content:
{content}
</input>

<task>
Analyze the content and provide a JSON response with:
1. 2-4 relevant categories that best describe the content
2. A concise 2-3 sentence summary
3. 3-5 specific topics covered in the content
</task>

<format>
{{
    "categories": ["category1", "category2"],
    "summary": "brief summary of the content",
    "topics": ["topic1", "topic2", "topic3"]
}}
</format>

<rules>
- Ensure response is valid JSON
- Keep categories and topics specific and relevant
- Summary should be clear and informative
- Do not include any text outside the JSON structure
</rules>

<response>"#,
        title = metadata.title,
        description = metadata.description,
        keywords = metadata.keywords,
        content = content,
    )
}

/// Best-effort recovery of the analysis object from free-form model output.
///
/// Takes everything from the first `{` to the last `}` and parses it as JSON.
/// Missing span, invalid JSON or an absent required key is an error; partial
/// results are never returned.
pub fn parse_analysis(raw: &str) -> Result<PageAnalysis> {
    let span = JSON_SPAN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
        .find(raw)
        .ok_or_else(|| AppError::MalformedOutput("no JSON object in response".to_string()))?;

    let parsed: RawAnalysis = serde_json::from_str(span.as_str())
        .map_err(|e| AppError::MalformedOutput(format!("invalid JSON: {}", e)))?;

    match parsed {
        RawAnalysis {
            categories: Some(categories),
            summary: Some(summary),
            topics: Some(topics),
        } if !summary.is_empty() => Ok(PageAnalysis {
            categories,
            summary,
            topics,
        }),
        _ => Err(AppError::MalformedOutput(
            "response is missing categories, summary or topics".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_around_json_is_discarded() {
        let raw = r#"Sure! {"categories":["Tech"],"summary":"ok","topics":["a"]} thanks"#;
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(
            analysis,
            PageAnalysis {
                categories: vec!["Tech".to_string()],
                summary: "ok".to_string(),
                topics: vec!["a".to_string()],
            }
        );
    }

    #[test]
    fn multiline_json_is_accepted() {
        let raw = "Here you go:\n{\n  \"categories\": [\"Science\", \"Space\"],\n  \"summary\": \"Rockets.\",\n  \"topics\": []\n}\n";
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(analysis.categories, vec!["Science", "Space"]);
        assert!(analysis.topics.is_empty());
    }

    #[test]
    fn no_brace_is_failure() {
        let err = parse_analysis("I could not categorize this page.").unwrap_err();
        assert!(matches!(err, AppError::MalformedOutput(_)));
    }

    #[test]
    fn invalid_json_is_failure() {
        assert!(parse_analysis(r#"{"categories": ["Tech",], }"#).is_err());
    }

    #[test]
    fn missing_key_is_failure() {
        let raw = r#"{"categories":["Tech"],"summary":"ok"}"#;
        assert!(matches!(
            parse_analysis(raw),
            Err(AppError::MalformedOutput(_))
        ));
    }

    #[test]
    fn empty_summary_is_failure() {
        let raw = r#"{"categories":["Tech"],"summary":"","topics":["a"]}"#;
        assert!(parse_analysis(raw).is_err());
    }

    #[test]
    fn greedy_span_covers_trailing_braces() {
        // The span runs to the last brace, so trailing braces break the parse.
        let raw = r#"{"categories":["Tech"],"summary":"ok","topics":["a"]} and {extra}"#;
        assert!(parse_analysis(raw).is_err());
    }

    #[test]
    fn prompt_truncates_content_and_includes_metadata() {
        let metadata = PageMetadata {
            title: "Crabs".to_string(),
            description: "All about crabs".to_string(),
            keywords: "crab, ocean".to_string(),
        };
        let content = "é".repeat(3000);

        let prompt = build_prompt(&content, &metadata);
        assert!(prompt.contains("Title: Crabs"));
        assert!(prompt.contains("Keywords: crab, ocean"));
        assert!(prompt.contains(&"é".repeat(2000)));
        assert!(!prompt.contains(&"é".repeat(2001)));
        assert!(prompt.ends_with("<response>"));
    }
}
