use serde::{Deserialize, Serialize};

/// Structured result the model is asked to produce for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub categories: Vec<String>,
    pub summary: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProcessStatus {
    #[default]
    Idle,
    Processing(String),
    Processed(String),
    Failed(String),
    LlmNotReady,
}
