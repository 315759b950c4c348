use std::sync::Mutex;

use pretty_assertions::assert_eq;
use sbot_ai::llm::Llm;
use sbot_ai::news::{news_digest, DEFAULT_NEWS_ITEMS, NEWS_QUERY};
use sbot_ai::search::{SearchHit, SearchProvider};
use sbot_core::error::{codes, AppError};

#[derive(Default)]
struct RecordingSearch {
    queries: Mutex<Vec<String>>,
    hits: Vec<SearchHit>,
}

impl SearchProvider for RecordingSearch {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.hits.clone())
    }
}

#[derive(Default)]
struct RecordingLlm {
    prompts: Mutex<Vec<String>>,
}

impl Llm for RecordingLlm {
    fn invoke(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("1. 🌞 Solar record".to_string())
    }
}

fn hits(n: usize) -> Vec<SearchHit> {
    (0..n)
        .map(|i| SearchHit {
            content: format!("story {i}"),
            url: format!("https://news.example/{i}"),
            title: if i == 0 { String::new() } else { format!("Headline {i}") },
        })
        .collect()
}

#[test]
fn digest_uses_top_items_and_fills_missing_titles() {
    let search = RecordingSearch {
        hits: hits(8),
        ..Default::default()
    };
    let llm = RecordingLlm::default();
    let digest = news_digest(&search, &llm, DEFAULT_NEWS_ITEMS).unwrap();

    assert_eq!(search.queries.lock().unwrap().as_slice(), &[NEWS_QUERY.to_string()]);
    assert_eq!(digest.summary, "1. 🌞 Solar record");
    assert_eq!(digest.items.len(), 5);
    assert_eq!(digest.items[0].title, "News 1");

    let prompt = &llm.prompts.lock().unwrap()[0];
    assert!(prompt.contains("TOP 5"));
    assert!(prompt.contains("Title: Headline 1\nContent: story 1\nURL: https://news.example/1"));
    assert!(!prompt.contains("story 5"));
}

#[test]
fn no_results_is_no_answer_found() {
    let search = RecordingSearch::default();
    let llm = RecordingLlm::default();
    let err = news_digest(&search, &llm, 5).expect_err("empty");
    assert_eq!(err.code, codes::NO_ANSWER_FOUND);
    assert!(llm.prompts.lock().unwrap().is_empty());
}
