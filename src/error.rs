use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Inference endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Model {0} not found. Please run: ollama pull {0}")]
    ModelMissing(String),

    #[error("LLM not initialized")]
    NotReady,

    #[error("Completion failed after {attempts} attempts")]
    CompletionExhausted { attempts: u32 },

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
