use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::ai::OllamaClient;
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Category, Content, PageAnalysis, ProcessStatus};
use crate::services::{ContentProcessor, PageFetcher};
use crate::tui::{AppAction, InputMode};

// Message for a finished page run
pub struct ProcessResult {
    pub url: String,
    pub result: std::result::Result<PageAnalysis, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Categories,
    Entries,
}

pub struct App {
    // Data
    pub categories: Vec<Category>,
    pub entries: Vec<Content>,
    pub entry_categories: Vec<Category>,

    // UI State
    pub selected_category: usize,
    pub selected_entry: usize,
    pub focus: Pane,
    pub input_mode: InputMode,
    pub input: String,
    pub search_query: Option<String>,
    pub show_help: bool,

    // Async state
    pub status: ProcessStatus,
    pub llm_ready: bool,
    pub in_flight: usize,
    process_rx: mpsc::Receiver<ProcessResult>,
    process_tx: mpsc::Sender<ProcessResult>,

    // Services
    pub repository: Repository,
    processor: Arc<ContentProcessor>,
    fetcher: Arc<PageFetcher>,
}

impl App {
    /// Opens the store and, when `connect_llm` is set, runs the model
    /// readiness check. Without it processing stays disabled.
    pub async fn new(config: &Config, connect_llm: bool) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;

        let client = OllamaClient::new(config)?;
        let llm_ready = if connect_llm {
            match client.initialize().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("LLM unavailable, processing disabled: {}", e);
                    false
                }
            }
        } else {
            false
        };

        let processor = Arc::new(ContentProcessor::new(Arc::new(client), repository.clone()));
        let fetcher = Arc::new(PageFetcher::new()?);

        let (process_tx, process_rx) = mpsc::channel(8);

        let mut app = Self {
            categories: Vec::new(),
            entries: Vec::new(),
            entry_categories: Vec::new(),
            selected_category: 0,
            selected_entry: 0,
            focus: Pane::Categories,
            input_mode: InputMode::Normal,
            input: String::new(),
            search_query: None,
            show_help: false,
            status: if llm_ready {
                ProcessStatus::Idle
            } else {
                ProcessStatus::LlmNotReady
            },
            llm_ready,
            in_flight: 0,
            process_rx,
            process_tx,
            repository,
            processor,
            fetcher,
        };
        app.reload().await?;
        Ok(app)
    }

    pub fn selected_entry(&self) -> Option<&Content> {
        self.entries.get(self.selected_entry)
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.categories.get(self.selected_category)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => match self.focus {
                Pane::Categories if self.selected_category > 0 => {
                    self.selected_category -= 1;
                    self.reload_entries().await?;
                }
                Pane::Entries if self.selected_entry > 0 => {
                    self.selected_entry -= 1;
                    self.reload_entry_categories().await?;
                }
                _ => {}
            },

            AppAction::MoveDown => match self.focus {
                Pane::Categories if self.selected_category + 1 < self.categories.len() => {
                    self.selected_category += 1;
                    self.reload_entries().await?;
                }
                Pane::Entries if self.selected_entry + 1 < self.entries.len() => {
                    self.selected_entry += 1;
                    self.reload_entry_categories().await?;
                }
                _ => {}
            },

            AppAction::SwitchPane => {
                self.focus = match self.focus {
                    Pane::Categories => Pane::Entries,
                    Pane::Entries => Pane::Categories,
                };
            }

            AppAction::Select => {
                if self.focus == Pane::Categories {
                    self.search_query = None;
                    self.reload_entries().await?;
                    self.focus = Pane::Entries;
                }
            }

            AppAction::OpenInBrowser => {
                if let Some(entry) = self.selected_entry() {
                    let url = entry.url.clone();
                    if let Err(e) = open::that(&url) {
                        tracing::warn!("Failed to open {}: {}", url, e);
                    }
                }
            }

            AppAction::Reload => {
                self.reload().await?;
            }

            AppAction::ClearSearch => {
                if self.search_query.take().is_some() {
                    self.reload_entries().await?;
                }
            }

            AppAction::StartSearch => {
                self.input_mode = InputMode::Search;
                self.input.clear();
            }

            AppAction::StartAddUrl => {
                self.input_mode = InputMode::Url;
                self.input.clear();
            }

            AppAction::InputChar(c) => {
                self.input.push(c);
            }

            AppAction::InputBackspace => {
                self.input.pop();
            }

            AppAction::InputConfirm => {
                let input = std::mem::take(&mut self.input);
                let input = input.trim().to_string();
                let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
                match mode {
                    InputMode::Search if !input.is_empty() => {
                        self.search_query = Some(input);
                        self.reload_entries().await?;
                        self.focus = Pane::Entries;
                    }
                    InputMode::Url if !input.is_empty() => {
                        self.start_processing(input);
                    }
                    _ => {}
                }
            }

            AppAction::InputCancel => {
                self.input_mode = InputMode::Normal;
                self.input.clear();
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        Ok(false)
    }

    fn start_processing(&mut self, url: String) {
        if !self.llm_ready {
            self.status = ProcessStatus::LlmNotReady;
            return;
        }

        self.status = ProcessStatus::Processing(url.clone());
        self.in_flight += 1;

        let processor = Arc::clone(&self.processor);
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.process_tx.clone();

        tokio::spawn(async move {
            let result = fetch_and_process(&fetcher, &processor, &url)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ProcessResult { url, result }).await;
        });
    }

    /// Poll for finished page runs (non-blocking)
    pub async fn poll_process_result(&mut self) -> Result<()> {
        if let Ok(finished) = self.process_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            match finished.result {
                Ok(analysis) => {
                    tracing::info!("Processed {}: {:?}", finished.url, analysis.categories);
                    self.status = ProcessStatus::Processed(format!(
                        "{} → {}",
                        finished.url,
                        analysis.categories.join(", ")
                    ));
                    self.reload().await?;
                }
                Err(e) => {
                    tracing::error!("Failed to process {}: {}", finished.url, e);
                    self.status = ProcessStatus::Failed(e);
                }
            }
        }
        Ok(())
    }

    /// Fetches `url` and runs it through the pipeline, waiting for the result.
    pub async fn process_url(&self, url: &str) -> Result<PageAnalysis> {
        if !self.llm_ready {
            return Err(AppError::NotReady);
        }
        fetch_and_process(&self.fetcher, &self.processor, url).await
    }

    pub async fn process_file(&self, path: &Path, url: Option<&str>) -> Result<PageAnalysis> {
        if !self.llm_ready {
            return Err(AppError::NotReady);
        }
        let markup = tokio::fs::read_to_string(path).await?;
        let url = match url {
            Some(url) => url.to_string(),
            None => format!("file://{}", path.display()),
        };
        self.processor.process_page(&url, &markup).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Content>> {
        self.processor.search(query).await
    }

    /// One stored record with the categories it is linked to.
    pub async fn show(&self, id: i64) -> Result<Option<(Content, Vec<Category>)>> {
        let Some(content) = self.repository.get_content(id).await? else {
            return Ok(None);
        };
        let categories = self.repository.get_categories_for_content(id).await?;
        Ok(Some((content, categories)))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.processor.list_categories().await
    }

    async fn reload(&mut self) -> Result<()> {
        self.categories = self.processor.list_categories().await?;
        if self.selected_category >= self.categories.len() {
            self.selected_category = self.categories.len().saturating_sub(1);
        }
        self.reload_entries().await
    }

    async fn reload_entries(&mut self) -> Result<()> {
        self.entries = if let Some(query) = &self.search_query {
            self.processor.search(query).await?
        } else if let Some(category) = self.categories.get(self.selected_category) {
            self.processor.content_for_category(category.id).await?
        } else {
            Vec::new()
        };
        if self.selected_entry >= self.entries.len() {
            self.selected_entry = self.entries.len().saturating_sub(1);
        }
        self.reload_entry_categories().await
    }

    async fn reload_entry_categories(&mut self) -> Result<()> {
        let entry_id = self.selected_entry().map(|entry| entry.id);
        self.entry_categories = match entry_id {
            Some(id) => self.repository.get_categories_for_content(id).await?,
            None => Vec::new(),
        };
        Ok(())
    }
}

async fn fetch_and_process(
    fetcher: &PageFetcher,
    processor: &ContentProcessor,
    url: &str,
) -> Result<PageAnalysis> {
    let markup = fetcher.fetch(url).await?;
    processor.process_page(url, &markup).await
}
