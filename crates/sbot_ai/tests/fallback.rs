use std::sync::Mutex;

use pretty_assertions::assert_eq;
use sbot_ai::fallback::WebFallback;
use sbot_ai::llm::Llm;
use sbot_ai::search::{SearchHit, SearchProvider};
use sbot_core::domain::ResponseMode;
use sbot_core::error::{codes, AppError};

#[derive(Default)]
struct EchoLlm {
    prompts: Mutex<Vec<String>>,
}

impl Llm for EchoLlm {
    fn invoke(&self, prompt: &str) -> Result<String, AppError> {
        let mut p = self.prompts.lock().unwrap();
        p.push(prompt.to_string());
        Ok(format!("response #{}", p.len()))
    }
}

struct FixedSearch(Vec<SearchHit>);

impl SearchProvider for FixedSearch {
    fn search(&self, _query: &str) -> Result<Vec<SearchHit>, AppError> {
        Ok(self.0.clone())
    }
}

struct BrokenSearch;

impl SearchProvider for BrokenSearch {
    fn search(&self, _query: &str) -> Result<Vec<SearchHit>, AppError> {
        Err(AppError::new(codes::LLM_FAILED, "socket closed").with_retryable(true))
    }
}

fn hit(content: &str) -> SearchHit {
    SearchHit {
        content: content.to_string(),
        url: format!("https://news.example/{}", content.len()),
        title: String::new(),
    }
}

fn five_hits() -> FixedSearch {
    FixedSearch(vec![
        hit("first result"),
        hit("second result"),
        hit("third result"),
        hit("fourth result"),
        hit("fifth result"),
    ])
}

#[test]
fn condensing_makes_two_model_calls_over_first_three_hits() {
    let llm = EchoLlm::default();
    let search = five_hits();
    let out = WebFallback::new(&search, &llm)
        .fallback_answer("Boeing emissions targets", ResponseMode::Concise)
        .unwrap();
    assert_eq!(out, "response #2");

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("first result\n\nsecond result\n\nthird result"));
    assert!(!prompts[0].contains("fourth result"));
    assert!(prompts[0].contains("User Query: Boeing emissions targets"));
    // The final prompt is built from the condensed summary.
    assert!(prompts[1].contains("response #1"));
    assert!(prompts[1].contains("short and clear paragraph"));
}

#[test]
fn without_condensing_one_call_sees_raw_contents() {
    let llm = EchoLlm::default();
    let search = five_hits();
    WebFallback::new(&search, &llm)
        .with_condense(false)
        .fallback_answer("q", ResponseMode::Detailed)
        .unwrap();

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("first result\n\nsecond result\n\nthird result"));
    assert!(prompts[0].contains("detailed and structured explanation"));
}

#[test]
fn search_failure_is_search_unavailable() {
    let llm = EchoLlm::default();
    let err = WebFallback::new(&BrokenSearch, &llm)
        .fallback_answer("q", ResponseMode::Concise)
        .expect_err("search down");
    assert_eq!(err.code, codes::SEARCH_UNAVAILABLE);
    assert!(err.retryable);
    assert!(llm.prompts.lock().unwrap().is_empty());
}

#[test]
fn no_hits_is_no_answer_found() {
    let llm = EchoLlm::default();
    let search = FixedSearch(vec![hit("   ")]);
    let err = WebFallback::new(&search, &llm)
        .fallback_answer("q", ResponseMode::Concise)
        .expect_err("empty");
    assert!(err.is_no_answer());
    assert!(llm.prompts.lock().unwrap().is_empty());

    let err = WebFallback::new(&FixedSearch(Vec::new()), &llm)
        .fallback_answer("q", ResponseMode::Concise)
        .expect_err("empty");
    assert_eq!(err.code, codes::NO_ANSWER_FOUND);
}

#[test]
fn fewer_than_three_hits_are_used_as_is() {
    let llm = EchoLlm::default();
    let search = FixedSearch(vec![hit("only one")]);
    WebFallback::new(&search, &llm)
        .with_condense(false)
        .fallback_answer("q", ResponseMode::Concise)
        .unwrap();
    assert!(llm.prompts.lock().unwrap()[0].contains("Search Results:\nonly one\n"));
}
