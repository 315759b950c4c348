use std::fs;
use std::sync::Mutex;

use clap::Parser;
use pretty_assertions::assert_eq;
use sbot_ai::embeddings::Embedder;
use sbot_ai::fallback::WebFallback;
use sbot_ai::index::VectorIndex;
use sbot_ai::llm::Llm;
use sbot_ai::pipeline::AnswerPipeline;
use sbot_ai::retrieve::Retriever;
use sbot_ai::search::{SearchHit, SearchProvider};
use sbot_ai::synth::AnswerSynthesizer;
use sbot_core::config::AppConfig;
use sbot_core::domain::{AnswerOrigin, Chunk, ResponseMode};
use sbot_core::email::{EmailMessage, Mailer};
use sbot_core::error::{codes, AppError};
use sustainabot_lib::{
    ask, classify_error, ingest, Cli, Command, EXIT_FAILURE, EXIT_NO_ANSWER,
};

struct FlatEmbedder;

impl Embedder for FlatEmbedder {
    fn model(&self) -> &str {
        "flat"
    }

    fn embed(&self, _input: &str) -> Result<Vec<f32>, AppError> {
        Ok(vec![1.0])
    }
}

#[derive(Default)]
struct CountingLlm {
    calls: Mutex<usize>,
}

impl Llm for CountingLlm {
    fn invoke(&self, _prompt: &str) -> Result<String, AppError> {
        *self.calls.lock().unwrap() += 1;
        Ok("Grid intensity fell.".to_string())
    }
}

struct NoSearch;

impl SearchProvider for NoSearch {
    fn search(&self, _query: &str) -> Result<Vec<SearchHit>, AppError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl Mailer for RecordingMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn pipeline<'a>(llm: &'a dyn Llm) -> AnswerPipeline<'a> {
    let chunk = Chunk::new("grid.txt", None, 0, "Grid intensity fell 8%.".to_string());
    let index = VectorIndex::build(vec![chunk], vec![vec![1.0]], "flat", "t").unwrap();
    AnswerPipeline::new(
        Retriever::with_index(&FlatEmbedder, index, 7),
        AnswerSynthesizer::new(llm),
        WebFallback::new(&NoSearch, llm),
    )
}

#[test]
fn parses_ask_with_mode_and_flags() {
    let cli = Cli::try_parse_from([
        "sustainabot",
        "--config",
        "custom.toml",
        "ask",
        "What is scope 3?",
        "--mode",
        "Detailed",
        "--json",
    ])
    .unwrap();
    assert_eq!(cli.config.to_str(), Some("custom.toml"));
    match cli.command {
        Command::Ask {
            question,
            mode,
            email,
            json,
        } => {
            assert_eq!(question, "What is scope 3?");
            assert_eq!(mode, ResponseMode::Detailed);
            assert_eq!(email, None);
            assert!(json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn defaults_to_concise_and_rejects_unknown_mode() {
    let cli = Cli::try_parse_from(["sustainabot", "chat"]).unwrap();
    assert_eq!(cli.config.to_str(), Some("sustainabot.toml"));
    assert!(matches!(cli.command, Command::Chat { mode: ResponseMode::Concise }));

    assert!(Cli::try_parse_from(["sustainabot", "ask", "q", "--mode", "verbose"]).is_err());
}

#[test]
fn no_answer_and_failures_map_to_distinct_exit_codes() {
    let (code, line) = classify_error(&AppError::new(codes::NO_ANSWER_FOUND, "nothing"));
    assert_eq!(code, EXIT_NO_ANSWER);
    assert!(line.starts_with("No relevant information found"));

    let (code, line) = classify_error(&AppError::new(codes::SEARCH_UNAVAILABLE, "down"));
    assert_eq!(code, EXIT_FAILURE);
    assert_eq!(line, "error: [SEARCH_UNAVAILABLE] down");
}

#[test]
fn ask_emails_the_final_answer() {
    let llm = CountingLlm::default();
    let mailer = RecordingMailer::default();
    let answer = ask(
        &pipeline(&llm),
        Some(&mailer),
        "Did grid intensity fall?",
        ResponseMode::Concise,
        Some(" esg@example.com "),
    )
    .unwrap();
    assert_eq!(answer.origin, AnswerOrigin::Corpus);

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "esg@example.com");
    assert!(sent[0].body.contains("Grid intensity fell."));
}

#[test]
fn ask_rejects_bad_recipient_before_any_model_call() {
    let llm = CountingLlm::default();
    let mailer = RecordingMailer::default();
    let err = ask(
        &pipeline(&llm),
        Some(&mailer),
        "q",
        ResponseMode::Concise,
        Some("not-an-address"),
    )
    .expect_err("bad address");
    assert_eq!(err.code, codes::EMAIL_INVALID);
    assert_eq!(*llm.calls.lock().unwrap(), 0);

    let err = ask(&pipeline(&llm), None, "q", ResponseMode::Concise, Some("a@example.com"))
        .expect_err("no mailer");
    assert_eq!(err.code, codes::EMAIL_FAILED);
    assert_eq!(*llm.calls.lock().unwrap(), 0);
}

#[test]
fn ingest_fails_on_folder_without_supported_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("report.pdf"), b"%PDF-1.7").unwrap();
    let cfg = AppConfig::default();

    let idx = dir.path().join("idx");
    let err = ingest(&cfg, Some(dir.path()), Some(idx.as_path())).expect_err("empty");
    assert_eq!(err.code, codes::INGEST_FAILED);
    assert!(!idx.exists());

    let missing = dir.path().join("missing");
    let err = ingest(&cfg, Some(missing.as_path()), None).expect_err("missing");
    assert_eq!(err.code, codes::INGEST_FAILED);
}
