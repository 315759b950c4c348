use std::collections::HashMap;
use std::fs;

use pretty_assertions::assert_eq;
use sbot_core::config::{AppConfig, IndexPolicy, LlmProvider};
use sbot_core::error::codes;

#[test]
fn defaults_match_upstream_behavior() {
    let cfg = AppConfig::default();
    assert_eq!(cfg.chunking.chunk_size, 500);
    assert_eq!(cfg.chunking.chunk_overlap, 100);
    assert_eq!(cfg.retrieval.top_k, 7);
    assert_eq!(cfg.llm.provider, LlmProvider::OpenaiCompat);
    assert_eq!(cfg.llm.model, "llama3-70b-8192");
    assert_eq!(cfg.pipeline.on_index_unavailable, IndexPolicy::Fallback);
    assert!(cfg.search.condense);
    assert!(cfg.validate().is_ok());
}

#[test]
fn partial_toml_keeps_defaults_for_missing_keys() {
    let cfg = AppConfig::from_toml_str(
        r#"
[retrieval]
top_k = 3

[pipeline]
on_index_unavailable = "abort"

[llm]
provider = "ollama"
base_url = "http://127.0.0.1:11434"
model = "llama3.2:3b"
"#,
    )
    .expect("parse");
    assert_eq!(cfg.retrieval.top_k, 3);
    assert_eq!(cfg.pipeline.on_index_unavailable, IndexPolicy::Abort);
    assert_eq!(cfg.llm.provider, LlmProvider::Ollama);
    assert_eq!(cfg.chunking.chunk_size, 500);
    assert_eq!(cfg.search.max_results, 5);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = AppConfig::load(&dir.path().join("absent.toml")).expect("load");
    assert_eq!(cfg, AppConfig::default());
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sustainabot.toml");
    fs::write(&path, "[chunking]\nchunk_size = 800\nchunk_overlap = 200\n").expect("write");
    let cfg = AppConfig::load(&path).expect("load");
    assert_eq!(cfg.chunking.chunk_size, 800);
    assert_eq!(cfg.chunking.chunk_overlap, 200);
}

#[test]
fn malformed_toml_is_config_invalid() {
    let err = AppConfig::from_toml_str("[retrieval\ntop_k = ").expect_err("should fail");
    assert_eq!(err.code, codes::CONFIG_INVALID);
}

#[test]
fn env_overlay_fills_secrets_and_ignores_blank_values() {
    let env: HashMap<&str, &str> = [
        ("GROQ_API_KEY", "gsk_test"),
        ("TAVILY_API_KEY", "   "),
        ("SMTP_EMAIL", "bot@example.org"),
    ]
    .into_iter()
    .collect();

    let mut cfg = AppConfig::default();
    cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.llm.api_key.as_deref(), Some("gsk_test"));
    assert_eq!(cfg.search.api_key, None);
    assert_eq!(cfg.email.sender.as_deref(), Some("bot@example.org"));
    assert_eq!(cfg.email.password, None);
}

#[test]
fn secrets_are_never_serialized() {
    let mut cfg = AppConfig::default();
    cfg.llm.api_key = Some("gsk_secret".to_string());
    cfg.email.password = Some("hunter2".to_string());
    let rendered = toml::to_string(&cfg).expect("serialize");
    assert!(!rendered.contains("gsk_secret"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn validation_rejects_bad_values() {
    let mut cfg = AppConfig::default();
    cfg.chunking.chunk_overlap = 500;
    assert_eq!(cfg.validate().unwrap_err().code, codes::CONFIG_INVALID);

    let mut cfg = AppConfig::default();
    cfg.retrieval.top_k = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = AppConfig::default();
    cfg.search.max_results = 2;
    assert!(cfg.validate().is_err());

    let mut cfg = AppConfig::default();
    cfg.timeouts.search_secs = 0;
    assert!(cfg.validate().is_err());
}
