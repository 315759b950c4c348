use sbot_core::domain::ResponseMode;
use sbot_core::error::{codes, AppError};

use crate::llm::Llm;
use crate::prompts::{condense_prompt, PromptTemplate};
use crate::search::SearchProvider;

/// Search hits whose content feeds the fallback answer.
pub const WEB_CONTEXT_RESULTS: usize = 3;

/// Answer path used when the corpus answer is not trusted: search, condense, re-synthesize.
pub struct WebFallback<'a> {
    search: &'a dyn SearchProvider,
    llm: &'a dyn Llm,
    condense: bool,
}

impl<'a> WebFallback<'a> {
    pub fn new(search: &'a dyn SearchProvider, llm: &'a dyn Llm) -> Self {
        Self {
            search,
            llm,
            condense: true,
        }
    }

    /// Toggle the intermediate summarization call.
    pub fn with_condense(mut self, condense: bool) -> Self {
        self.condense = condense;
        self
    }

    /// Search text for `query`: the first three hits' contents, optionally condensed.
    pub fn gather(&self, query: &str) -> Result<String, AppError> {
        let hits = self.search.search(query).map_err(|e| {
            if e.is(codes::SEARCH_UNAVAILABLE) {
                e
            } else {
                AppError::new(codes::SEARCH_UNAVAILABLE, "Web search failed")
                    .with_details(e.to_string())
                    .with_retryable(e.retryable)
            }
        })?;

        let contents = hits
            .iter()
            .take(WEB_CONTEXT_RESULTS)
            .map(|h| h.content.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>();
        if contents.is_empty() {
            return Err(AppError::new(
                codes::NO_ANSWER_FOUND,
                "No relevant information found from web search",
            )
            .with_details(format!("hits={}", hits.len())));
        }
        tracing::debug!(hits = hits.len(), used = contents.len(), "web search done");

        let joined = contents.join("\n\n");
        if !self.condense {
            return Ok(joined);
        }
        let summary = self.llm.invoke(&condense_prompt(query, &joined))?;
        Ok(summary.trim().to_string())
    }

    pub fn fallback_answer(&self, query: &str, mode: ResponseMode) -> Result<String, AppError> {
        let search_text = self.gather(query)?;
        let prompt = PromptTemplate::for_mode(mode).render_web(&search_text, query);
        self.llm.invoke(&prompt)
    }
}
