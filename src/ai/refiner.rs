use std::sync::Arc;

use crate::error::Result;

use super::OllamaClient;

/// Asks the model to relate newly categorized content to its category.
/// The answer is free-form text with no structure check.
pub struct KnowledgeRefiner {
    client: Arc<OllamaClient>,
}

impl KnowledgeRefiner {
    pub fn new(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }

    pub async fn refine(&self, category: &str, new_content: &str) -> Result<String> {
        tracing::debug!(
            "Updating knowledge for category {:?} ({} chars)",
            category,
            new_content.len()
        );
        self.client.generate(&build_prompt(category, new_content)).await
    }
}

pub fn build_prompt(category: &str, new_content: &str) -> String {
    format!(
        r#"<system>You are a knowledgeable curator specializing in organizing and synthesizing information for the category: {category}</system>

<input>
{new_content}
</input>

<task>
Analyze this new information and provide:
1. Key points and insights
2. Relationship to the {category} category
3. Emerging patterns or trends
4. Potential sub-categories
</task>

<format>
Provide a structured response with clear headings and bullet points.
Focus on accuracy and relevance to the category.
</format>

<response>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_category_and_content() {
        let prompt = build_prompt("Astronomy", "Title: Moons\nSummary: Jupiter has many.");
        assert!(prompt.contains("for the category: Astronomy</system>"));
        assert!(prompt.contains("Relationship to the Astronomy category"));
        assert!(prompt.contains("Summary: Jupiter has many."));
        assert!(!prompt.contains("JSON"));
    }
}
