use std::path::PathBuf;
use std::sync::OnceLock;

use sbot_core::domain::Chunk;
use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use crate::embeddings::Embedder;
use crate::index::VectorIndex;

pub const DEFAULT_TOP_K: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Chunks ordered by descending similarity, at most `top_k` long.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievalHit>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

/// Embeds a query and searches the corpus index.
///
/// The index is loaded from disk on first use and cached for the lifetime of the retriever.
/// A failed load is not cached, so a later call retries it.
pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    index_dir: PathBuf,
    top_k: usize,
    index: OnceLock<VectorIndex>,
}

impl<'a> Retriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, index_dir: PathBuf, top_k: usize) -> Self {
        Self {
            embedder,
            index_dir,
            top_k: top_k.max(1),
            index: OnceLock::new(),
        }
    }

    /// Retriever over an index that is already in memory.
    pub fn with_index(embedder: &'a dyn Embedder, index: VectorIndex, top_k: usize) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(index);
        Self {
            embedder,
            index_dir: PathBuf::new(),
            top_k: top_k.max(1),
            index: cell,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    fn index(&self) -> Result<&VectorIndex, AppError> {
        if let Some(ix) = self.index.get() {
            return Ok(ix);
        }
        let loaded = VectorIndex::load(&self.index_dir, self.embedder.model())?;
        Ok(self.index.get_or_init(|| loaded))
    }

    pub fn retrieve(&self, query: &str) -> Result<RetrievalResult, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new(codes::QUERY_INVALID, "Query must not be empty"));
        }

        let index = self.index()?;
        let qv = self.embedder.embed(q)?;
        let hits = index.query(&qv, self.top_k)?;
        tracing::debug!(hits = hits.len(), top_k = self.top_k, "corpus retrieval done");
        Ok(RetrievalResult { hits })
    }
}
