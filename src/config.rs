use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

const APP_DIR: &str = "page-knowledge";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Base of the Ollama HTTP API, without a trailing slash.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("knowledge.db").to_string_lossy().to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434/api".to_string()
}

fn default_model() -> String {
    "llama2:latest".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ollama_url: default_ollama_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.ollama_url = config.ollama_url.trim_end_matches('/').to_string();
        if config.model.trim().is_empty() {
            return Err(AppError::Config("model must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config = Config::from_toml("model = \"mistral:7b\"\n").unwrap();
        assert_eq!(config.model, "mistral:7b");
        assert_eq!(config.ollama_url, "http://localhost:11434/api");
        assert_eq!(config.request_timeout_secs, 120);
        assert!(config.db_path.ends_with("knowledge.db"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = Config::from_toml("ollama_url = \"http://gpu-box:11434/api/\"\n").unwrap();
        assert_eq!(config.ollama_url, "http://gpu-box:11434/api");
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = Config::from_toml("model = \"  \"\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
