use std::sync::Arc;

use crate::ai::{Categorizer, KnowledgeRefiner, OllamaClient};
use crate::browser::ContentExtractor;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{Category, Content, PageAnalysis, PageMetadata};

const UNTITLED: &str = "Untitled Page";

/// Runs one page through extraction, categorization, storage and
/// per-category knowledge refinement.
///
/// Steps run strictly in sequence. A categorization or storage failure ends
/// the run; a refinement failure only skips that category's refinement.
pub struct ContentProcessor {
    extractor: ContentExtractor,
    categorizer: Categorizer,
    refiner: KnowledgeRefiner,
    repository: Repository,
}

impl ContentProcessor {
    pub fn new(client: Arc<OllamaClient>, repository: Repository) -> Self {
        Self {
            extractor: ContentExtractor::new(),
            categorizer: Categorizer::new(Arc::clone(&client)),
            refiner: KnowledgeRefiner::new(client),
            repository,
        }
    }

    /// Extracts visible text and metadata from `markup`, then processes it.
    pub async fn process_page(&self, url: &str, markup: &str) -> Result<PageAnalysis> {
        let page = self.extractor.extract(markup);
        self.process_content(url, &page.content, page.metadata).await
    }

    pub async fn process_content(
        &self,
        url: &str,
        content: &str,
        mut metadata: PageMetadata,
    ) -> Result<PageAnalysis> {
        if metadata.title.trim().is_empty() {
            metadata.title = UNTITLED.to_string();
        }
        tracing::info!("Processing {} ({} chars)", url, content.len());

        let analysis = self.categorizer.categorize(content, &metadata).await?;

        let content_id = self
            .repository
            .add_content(url, &metadata.title, &analysis.summary, content)
            .await?;

        let knowledge_input = format!("Title: {}\nSummary: {}", metadata.title, analysis.summary);

        for category in &analysis.categories {
            let category_id = self.repository.add_category(category, "").await?;
            self.repository
                .link_content_to_category(content_id, category_id)
                .await?;

            match self.refiner.refine(category, &knowledge_input).await {
                Ok(knowledge) => {
                    tracing::debug!("Knowledge for {}:\n{}", category, knowledge);
                }
                Err(e) => {
                    tracing::warn!("Knowledge refinement failed for {}: {}", category, e);
                }
            }
        }

        tracing::info!(
            "Stored content {} under {} categories",
            content_id,
            analysis.categories.len()
        );
        Ok(analysis)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.repository.get_categories().await
    }

    pub async fn content_for_category(&self, category_id: i64) -> Result<Vec<Content>> {
        self.repository.get_content_by_category(category_id).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Content>> {
        self.repository.search_content(query).await
    }
}
