use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes shared by the core, the answer pipeline and the CLI.
pub mod codes {
    pub const INDEX_UNAVAILABLE: &str = "INDEX_UNAVAILABLE";
    pub const INDEX_BUILD_FAILED: &str = "INDEX_BUILD_FAILED";
    pub const LLM_FAILED: &str = "LLM_FAILED";
    pub const EMBEDDINGS_FAILED: &str = "EMBEDDINGS_FAILED";
    pub const SEARCH_UNAVAILABLE: &str = "SEARCH_UNAVAILABLE";
    /// Nothing relevant was found anywhere; not a service failure.
    pub const NO_ANSWER_FOUND: &str = "NO_ANSWER_FOUND";
    pub const QUERY_INVALID: &str = "QUERY_INVALID";
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const INGEST_FAILED: &str = "INGEST_FAILED";
    pub const EMAIL_INVALID: &str = "EMAIL_INVALID";
    pub const EMAIL_FAILED: &str = "EMAIL_FAILED";
    pub const REMOTE_URL_INVALID: &str = "REMOTE_URL_INVALID";
}

/// Single structured error shape used across the workspace and surfaced by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// True when the failure means "no confident answer exists", as opposed to an
    /// external service or configuration failure.
    pub fn is_no_answer(&self) -> bool {
        self.is(codes::NO_ANSWER_FOUND)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(d) = self.details.as_deref() {
            write!(f, " ({d})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
