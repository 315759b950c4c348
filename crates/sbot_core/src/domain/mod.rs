use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{codes, AppError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMeta {
    pub origin_path: String,
    /// 1-based page number when the source text carried page breaks.
    pub page: Option<u32>,
}

/// Raw ingested unit. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub source_id: String,
    pub full_text: String,
    pub metadata: DocumentMeta,
}

/// Bounded slice of a document's text.
///
/// `offset` is measured in chars from the start of the parent document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    pub parent_source_id: String,
    pub page: Option<u32>,
    pub offset: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(parent_source_id: &str, page: Option<u32>, offset: usize, text: String) -> Self {
        let page_label = page.map(|p| p.to_string()).unwrap_or_default();
        let payload = format!(
            "source={parent_source_id}\npage={page_label}\noffset={offset}\ntext={text}"
        );
        let chunk_id = hex::encode(Sha256::digest(payload.as_bytes()));
        Self {
            chunk_id,
            parent_source_id: parent_source_id.to_string(),
            page,
            offset,
            text,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    #[default]
    Concise,
    Detailed,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Concise => "concise",
            ResponseMode::Detailed => "detailed",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Ok(ResponseMode::Concise),
            "detailed" => Ok(ResponseMode::Detailed),
            other => Err(AppError::new(
                codes::QUERY_INVALID,
                "Response mode must be concise or detailed",
            )
            .with_details(format!("mode={other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub mode: ResponseMode,
}

impl Query {
    pub fn new(text: impl Into<String>, mode: ResponseMode) -> Self {
        Self {
            text: text.into(),
            mode,
        }
    }
}

/// Provenance of a final answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    Corpus,
    Web,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The corpus answer tripped the confidence gate.
    LowConfidence,
    /// The vector index could not be loaded and policy routed the query to the web.
    IndexUnavailable,
}

/// Answer pipeline states, in the order they were entered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    RetrievingCorpus,
    EvaluatingConfidence,
    FallingBackToWeb,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub origin: AnswerOrigin,
    pub mode: ResponseMode,
    pub fallback_reason: Option<FallbackReason>,
    pub trace: Vec<PipelineStage>,
}
