use sbot_core::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub content: String,
    pub url: String,
    pub title: String,
}

/// Web search port. Hits come back in provider rank order.
///
/// Missing credentials and provider failures are both `SEARCH_UNAVAILABLE`.
pub trait SearchProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError>;
}

pub mod tavily;

pub use tavily::TavilySearch;
