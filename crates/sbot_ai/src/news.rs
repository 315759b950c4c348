use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use crate::llm::Llm;
use crate::prompts::news_prompt;
use crate::search::{SearchHit, SearchProvider};

pub const NEWS_QUERY: &str = "latest renewable energy news and developments this week";
pub const DEFAULT_NEWS_ITEMS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsDigest {
    /// Curated, model-written list.
    pub summary: String,
    /// Source hits, for linking back to the originals.
    pub items: Vec<SearchHit>,
}

/// Curated digest of this week's renewable-energy news.
pub fn news_digest(
    search: &dyn SearchProvider,
    llm: &dyn Llm,
    limit: usize,
) -> Result<NewsDigest, AppError> {
    let items = search
        .search(NEWS_QUERY)?
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, mut hit)| {
            if hit.title.trim().is_empty() {
                hit.title = format!("News {}", i + 1);
            }
            hit
        })
        .collect::<Vec<_>>();
    if items.is_empty() {
        return Err(AppError::new(codes::NO_ANSWER_FOUND, "No news results found"));
    }

    let formatted = items
        .iter()
        .map(|h| format!("Title: {}\nContent: {}\nURL: {}", h.title, h.content, h.url))
        .collect::<Vec<_>>()
        .join("\n\n");
    let summary = llm.invoke(&news_prompt(&formatted, limit))?;
    Ok(NewsDigest { summary, items })
}
