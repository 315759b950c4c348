use std::time::Duration;

use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::{SearchHit, SearchProvider};
use crate::http::{decode_error, request_error};

#[derive(Debug, Clone)]
pub struct TavilySearch {
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
    timeout: Duration,
}

impl TavilySearch {
    /// A missing key is accepted here and reported on the first `search` call.
    pub fn new(base_url: &str, api_key: Option<&str>, max_results: usize, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            max_results,
            timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl SearchProvider for TavilySearch {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::new(codes::SEARCH_UNAVAILABLE, "Search API key is not configured")
                .with_details("set TAVILY_API_KEY")
        })?;

        let url = format!("{}/search", self.base_url);
        let req = TavilyRequest {
            api_key,
            query,
            max_results: self.max_results,
            search_depth: "basic",
        };
        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(req)
            .map_err(|e| request_error(codes::SEARCH_UNAVAILABLE, "search", e))?;
        let v: TavilyResponse = resp
            .into_json()
            .map_err(|e| decode_error(codes::SEARCH_UNAVAILABLE, "search", e))?;

        Ok(v.results
            .into_iter()
            .map(|r| SearchHit {
                content: r.content,
                url: r.url,
                title: r.title,
            })
            .collect())
    }
}
