//! Application configuration.
//!
//! Loaded from a TOML file where every field has a default, then overlaid with secrets from
//! the environment. A missing file is not an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

pub const DEFAULT_CONFIG_FILE: &str = "sustainabot.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub email: EmailConfig,
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder of `.txt` / `.md` reports consumed by `ingest`.
    pub docs_dir: PathBuf,
    /// Location of the persisted vector index artifact.
    pub index_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("data/reports"),
            index_dir: PathBuf::from("vector_db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 7 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Ollama base URL.
    pub base_url: String,
    pub model: String,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "nomic-embed-text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Any OpenAI-compatible `/chat/completions` endpoint (Groq by default).
    OpenaiCompat,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Overlaid from `GROQ_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenaiCompat,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-70b-8192".to_string(),
            temperature: 0.7,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// Results requested from the provider; the fallback path reads the first three.
    pub max_results: usize,
    /// Pre-summarize search contents with an extra LLM call before the final answer.
    pub condense: bool,
    /// Overlaid from `TAVILY_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            max_results: 5,
            condense: true,
            api_key: None,
        }
    }
}

/// What the pipeline does when the vector index cannot be loaded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexPolicy {
    /// Treat the corpus answer as empty and let the confidence gate route to the web.
    #[default]
    Fallback,
    /// Surface `INDEX_UNAVAILABLE` to the caller.
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub on_index_unavailable: IndexPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address, also the SMTP username. Overlaid from `SMTP_EMAIL`.
    pub sender: Option<String>,
    /// Overlaid from `SMTP_PASSWORD`.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub llm_secs: u64,
    pub embed_secs: u64,
    pub search_secs: u64,
    pub email_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            llm_secs: 60,
            embed_secs: 10,
            search_secs: 15,
            email_secs: 30,
        }
    }
}

impl TimeoutsConfig {
    pub fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_secs)
    }

    pub fn embed(&self) -> Duration {
        Duration::from_secs(self.embed_secs)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn email(&self) -> Duration {
        Duration::from_secs(self.email_secs)
    }
}

impl AppConfig {
    /// Parse a TOML document. Unknown keys are ignored; missing keys take defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| {
            AppError::new(codes::CONFIG_INVALID, "Failed to parse configuration")
                .with_details(e.to_string())
        })
    }

    /// Load configuration from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new(codes::CONFIG_INVALID, "Failed to read configuration file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Overlay secrets from the environment. `lookup` is injected so tests avoid process env.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("GROQ_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = non_empty("TAVILY_API_KEY") {
            self.search.api_key = Some(v);
        }
        if let Some(v) = non_empty("SMTP_EMAIL") {
            self.email.sender = Some(v);
        }
        if let Some(v) = non_empty("SMTP_PASSWORD") {
            self.email.password = Some(v);
        }
    }

    pub fn from_process_env(path: &Path) -> Result<Self, AppError> {
        let mut cfg = Self::load(path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: &str, details: String| {
            Err(AppError::new(codes::CONFIG_INVALID, msg).with_details(details))
        };
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return invalid("chunking.chunk_size must be positive", "chunk_size=0".into());
        }
        if c.chunk_overlap >= c.chunk_size {
            return invalid(
                "chunking.chunk_overlap must be smaller than chunk_size",
                format!("chunk_size={}; chunk_overlap={}", c.chunk_size, c.chunk_overlap),
            );
        }
        if !(1..=50).contains(&self.retrieval.top_k) {
            return invalid(
                "retrieval.top_k must be within 1..=50",
                format!("top_k={}", self.retrieval.top_k),
            );
        }
        if self.search.max_results < 3 {
            return invalid(
                "search.max_results must be at least 3",
                format!("max_results={}", self.search.max_results),
            );
        }
        let t = &self.timeouts;
        if t.llm_secs == 0 || t.embed_secs == 0 || t.search_secs == 0 || t.email_secs == 0 {
            return invalid(
                "timeouts must be positive",
                format!(
                    "llm={}; embed={}; search={}; email={}",
                    t.llm_secs, t.embed_secs, t.search_secs, t.email_secs
                ),
            );
        }
        Ok(())
    }
}
