use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sbot_ai::embeddings::OllamaEmbedder;
use sbot_ai::fallback::WebFallback;
use sbot_ai::index::{build_index_with_embedder, IndexManifest, VectorIndex};
use sbot_ai::llm::{Llm, OllamaLlm, OpenAiCompatLlm};
use sbot_ai::news::{news_digest, DEFAULT_NEWS_ITEMS};
use sbot_ai::ollama::OllamaClient;
use sbot_ai::pipeline::AnswerPipeline;
use sbot_ai::retrieve::Retriever;
use sbot_ai::search::TavilySearch;
use sbot_ai::synth::AnswerSynthesizer;
use sbot_core::config::{AppConfig, LlmProvider, DEFAULT_CONFIG_FILE};
use sbot_core::domain::{Answer, AnswerOrigin, Query, ResponseMode};
use sbot_core::email::{compose_answer_email, parse_mailbox, Mailer, SmtpMailer};
use sbot_core::error::{codes, AppError};
use sbot_core::ingest::{load_documents_from_dir, TextSplitter};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub mod logging;
pub mod session;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_NO_ANSWER: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "sustainabot",
    version,
    about = "Answer sustainability questions from a report corpus, falling back to web search"
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk and embed the report folder into a fresh vector index.
    Ingest {
        #[arg(long)]
        docs: Option<PathBuf>,
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Answer one question.
    Ask {
        question: String,
        #[arg(long, default_value_t = ResponseMode::Concise)]
        mode: ResponseMode,
        /// Also send the answer to this address.
        #[arg(long)]
        email: Option<String>,
        /// Print the full answer record as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive question loop.
    Chat {
        #[arg(long, default_value_t = ResponseMode::Concise)]
        mode: ResponseMode,
    },
    /// This week's renewable-energy headlines.
    News {
        #[arg(long)]
        json: bool,
    },
    /// Check that the local Ollama daemon and the vector index are usable.
    Health,
}

#[derive(Debug, serde::Serialize)]
pub struct IngestSummary {
    pub documents: usize,
    pub chunks: usize,
    pub index_dir: String,
    pub manifest: IndexManifest,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub message: String,
    pub index: Option<IndexManifest>,
    pub index_error: Option<String>,
    pub llm_key_configured: bool,
    pub search_key_configured: bool,
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::new("CLI_TIME_FAILED", "Failed to format time").with_details(e.to_string()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new("CLI_OUTPUT_FAILED", "Failed to encode output").with_details(e.to_string())
    })?;
    println!("{s}");
    Ok(())
}

pub fn build_embedder(cfg: &AppConfig) -> Result<OllamaEmbedder, AppError> {
    let client = OllamaClient::new(&cfg.embeddings.base_url)?;
    Ok(OllamaEmbedder::new(
        client,
        &cfg.embeddings.model,
        cfg.timeouts.embed(),
    ))
}

pub fn build_llm(cfg: &AppConfig) -> Result<Box<dyn Llm>, AppError> {
    let c = &cfg.llm;
    Ok(match c.provider {
        LlmProvider::OpenaiCompat => Box::new(OpenAiCompatLlm::new(
            &c.base_url,
            c.api_key.as_deref(),
            &c.model,
            c.temperature,
            cfg.timeouts.llm(),
        )?),
        LlmProvider::Ollama => Box::new(OllamaLlm::new(
            OllamaClient::new(&c.base_url)?,
            &c.model,
            c.temperature,
            cfg.timeouts.llm(),
        )),
    })
}

pub fn build_search(cfg: &AppConfig) -> TavilySearch {
    TavilySearch::new(
        &cfg.search.base_url,
        cfg.search.api_key.as_deref(),
        cfg.search.max_results,
        cfg.timeouts.search(),
    )
}

/// Owned clients for one CLI invocation; pipelines borrow from here.
pub struct Services {
    config: AppConfig,
    embedder: OllamaEmbedder,
    llm: Box<dyn Llm>,
    search: TavilySearch,
}

impl Services {
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            embedder: build_embedder(&config)?,
            llm: build_llm(&config)?,
            search: build_search(&config),
            config,
        })
    }

    pub fn pipeline(&self) -> AnswerPipeline<'_> {
        let cfg = &self.config;
        let retriever = Retriever::new(
            &self.embedder,
            cfg.paths.index_dir.clone(),
            cfg.retrieval.top_k,
        );
        let fallback =
            WebFallback::new(&self.search, self.llm.as_ref()).with_condense(cfg.search.condense);
        AnswerPipeline::new(retriever, AnswerSynthesizer::new(self.llm.as_ref()), fallback)
            .with_index_policy(cfg.pipeline.on_index_unavailable)
    }
}

pub fn ingest(
    cfg: &AppConfig,
    docs: Option<&Path>,
    index: Option<&Path>,
) -> Result<IngestSummary, AppError> {
    let docs_dir = docs.unwrap_or(cfg.paths.docs_dir.as_path());
    let index_dir = index.unwrap_or(cfg.paths.index_dir.as_path());

    let documents = load_documents_from_dir(docs_dir)?;
    if documents.is_empty() {
        return Err(AppError::new(codes::INGEST_FAILED, "No supported documents found")
            .with_details(format!("path={}; extensions=txt,md", docs_dir.display())));
    }
    let splitter = TextSplitter::new(cfg.chunking.chunk_size, cfg.chunking.chunk_overlap)?;
    let chunks = splitter.split_documents(&documents);
    let chunk_count = chunks.len();
    tracing::info!(
        documents = documents.len(),
        chunks = chunk_count,
        "documents split; embedding"
    );

    let embedder = build_embedder(cfg)?;
    let manifest = build_index_with_embedder(chunks, &embedder, index_dir, &now_rfc3339_utc()?)?;
    Ok(IngestSummary {
        documents: documents.len(),
        chunks: chunk_count,
        index_dir: index_dir.to_string_lossy().to_string(),
        manifest,
    })
}

/// Answer `question`, optionally emailing the result.
///
/// The recipient and the mailer are checked before any model call.
pub fn ask(
    pipeline: &AnswerPipeline<'_>,
    mailer: Option<&dyn Mailer>,
    question: &str,
    mode: ResponseMode,
    email: Option<&str>,
) -> Result<Answer, AppError> {
    let delivery = match email {
        Some(addr) => {
            parse_mailbox(addr)?;
            let mailer = mailer.ok_or_else(|| {
                AppError::new(codes::EMAIL_FAILED, "Email is not configured")
                    .with_details("set SMTP_EMAIL and SMTP_PASSWORD")
            })?;
            Some((addr, mailer))
        }
        None => None,
    };

    let answer = pipeline.answer(&Query::new(question, mode))?;
    if let Some((addr, mailer)) = delivery {
        mailer.send(&compose_answer_email(addr, question, &answer.text))?;
    }
    Ok(answer)
}

pub fn health(cfg: &AppConfig) -> HealthStatus {
    let ollama = OllamaClient::new(&cfg.embeddings.base_url).and_then(|c| {
        c.health_check()?;
        Ok(c)
    });
    let (index, index_error) = match VectorIndex::load(&cfg.paths.index_dir, &cfg.embeddings.model) {
        Ok(ix) => (Some(ix.manifest().clone()), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let (ok, message) = match ollama {
        Ok(c) => (true, format!("Ollama reachable on {}", c.base_url())),
        Err(e) => (false, e.to_string()),
    };
    HealthStatus {
        ok,
        message,
        index,
        index_error,
        llm_key_configured: cfg.llm.provider == LlmProvider::Ollama || cfg.llm.api_key.is_some(),
        search_key_configured: cfg.search.api_key.is_some(),
    }
}

/// Map an error to the process exit code and a one-line explanation.
pub fn classify_error(err: &AppError) -> (i32, String) {
    if err.is_no_answer() {
        (
            EXIT_NO_ANSWER,
            "No relevant information found in the reports or on the web.".to_string(),
        )
    } else {
        (EXIT_FAILURE, format!("error: {err}"))
    }
}

fn mailer_from(cfg: &AppConfig) -> Option<SmtpMailer> {
    match SmtpMailer::from_config(&cfg.email, &cfg.timeouts) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::debug!(error = %e, "email delivery disabled");
            None
        }
    }
}

fn execute(cli: Cli) -> Result<(), AppError> {
    let cfg = AppConfig::from_process_env(&cli.config)?;

    match cli.command {
        Command::Ingest { docs, index } => {
            let summary = ingest(&cfg, docs.as_deref(), index.as_deref())?;
            print_json(&summary)
        }
        Command::Ask {
            question,
            mode,
            email,
            json,
        } => {
            let mailer = match email {
                Some(_) => Some(SmtpMailer::from_config(&cfg.email, &cfg.timeouts)?),
                None => None,
            };
            let services = Services::from_config(cfg)?;
            let answer = ask(
                &services.pipeline(),
                mailer.as_ref().map(|m| m as &dyn Mailer),
                &question,
                mode,
                email.as_deref(),
            )?;
            if json {
                return print_json(&answer);
            }
            println!("{}", answer.text);
            if answer.origin == AnswerOrigin::Web {
                eprintln!("(answered from web search)");
            }
            Ok(())
        }
        Command::Chat { mode } => {
            let mailer = mailer_from(&cfg);
            let services = Services::from_config(cfg)?;
            let pipeline = services.pipeline();
            let stdin = io::stdin();
            session::run_chat(
                &pipeline,
                mailer.as_ref().map(|m| m as &dyn Mailer),
                mode,
                stdin.lock(),
                io::stdout(),
            )?;
            Ok(())
        }
        Command::News { json } => {
            let llm = build_llm(&cfg)?;
            let digest = news_digest(&build_search(&cfg), llm.as_ref(), DEFAULT_NEWS_ITEMS)?;
            if json {
                return print_json(&digest);
            }
            println!("{}", digest.summary);
            Ok(())
        }
        Command::Health => {
            let status = health(&cfg);
            print_json(&status)?;
            if status.ok {
                Ok(())
            } else {
                Err(AppError::new(codes::EMBEDDINGS_FAILED, "Health check failed"))
            }
        }
    }
}

/// Run one CLI invocation and return the process exit code.
pub fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            let (code, line) = classify_error(&e);
            tracing::debug!(code = %e.code, retryable = e.retryable, "command failed");
            eprintln!("{line}");
            let _ = io::stderr().flush();
            code
        }
    }
}
