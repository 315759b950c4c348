//! Persistent nearest-neighbour index over corpus chunks.
//!
//! The artifact is a directory holding `index_manifest.json` and `index_vectors.json`. Both
//! are written to a temp file and renamed into place, vectors first, so a reader never sees a
//! manifest describing vectors that are not on disk yet. The index is rebuilt in full on
//! every ingestion run; there is no incremental update. Building and querying the same
//! directory concurrently is not supported.

use std::fs;
use std::path::Path;

use sbot_core::domain::Chunk;
use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::embeddings::Embedder;
use crate::retrieve::RetrievalHit;

pub const INDEX_FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "index_manifest.json";
const VECTORS_FILE: &str = "index_vectors.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexManifest {
    pub format_version: u32,
    pub model: String,
    pub dims: u32,
    pub chunk_count: u32,
    /// SHA-256 over the sorted chunk ids; identifies the corpus the index was built from.
    pub corpus_sha256: String,
    pub built_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    records: Vec<IndexRecord>,
}

fn unavailable(message: &str, dir: &Path, err: impl std::fmt::Display) -> AppError {
    AppError::new(codes::INDEX_UNAVAILABLE, message)
        .with_details(format!("path={}; err={}", dir.display(), err))
}

fn build_failed(message: &str, details: String) -> AppError {
    AppError::new(codes::INDEX_BUILD_FAILED, message).with_details(details)
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity, `None` when either vector has zero length or the score is not finite.
fn cosine(a: &[f32], a_norm: f32, b: &[f32]) -> Option<f32> {
    let b_norm = norm(b);
    if a_norm == 0.0 || b_norm == 0.0 {
        return None;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    Some(dot / (a_norm * b_norm)).filter(|s| s.is_finite())
}

fn corpus_fingerprint(records: &[IndexRecord]) -> String {
    let mut hasher = Sha256::new();
    for r in records {
        hasher.update(r.chunk.chunk_id.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| {
        build_failed(
            "Failed to write index file",
            format!("path={}; err={}", tmp.display(), e),
        )
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        build_failed(
            "Failed to finalize index file",
            format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e),
        )
    })
}

impl VectorIndex {
    /// Assemble an in-memory index. `embeddings[i]` belongs to `chunks[i]`.
    pub fn build(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        model: &str,
        built_at: &str,
    ) -> Result<Self, AppError> {
        if chunks.is_empty() {
            return Err(build_failed("No chunks to index", format!("model={model}")));
        }
        if chunks.len() != embeddings.len() {
            return Err(build_failed(
                "Chunk and embedding counts differ",
                format!("chunks={}; embeddings={}", chunks.len(), embeddings.len()),
            ));
        }

        let dims = embeddings[0].len();
        if dims == 0 {
            return Err(build_failed("Embedding vectors are empty", format!("model={model}")));
        }

        let mut records = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(embeddings) {
            if vector.len() != dims {
                return Err(build_failed(
                    "Embedding dimension mismatch across chunks",
                    format!(
                        "expected={dims}; got={}; chunk_id={}",
                        vector.len(),
                        chunk.chunk_id
                    ),
                ));
            }
            records.push(IndexRecord { chunk, vector });
        }
        // Stable order: chunk_id asc. Identical chunks collapse to one record.
        records.sort_by(|a, b| a.chunk.chunk_id.cmp(&b.chunk.chunk_id));
        records.dedup_by(|a, b| a.chunk.chunk_id == b.chunk.chunk_id);

        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            model: model.to_string(),
            dims: dims as u32,
            chunk_count: records.len() as u32,
            corpus_sha256: corpus_fingerprint(&records),
            built_at: built_at.to_string(),
        };
        Ok(Self { manifest, records })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn save(&self, dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(dir).map_err(|e| {
            build_failed(
                "Failed to create index directory",
                format!("path={}; err={}", dir.display(), e),
            )
        })?;
        let vectors = serde_json::to_vec(&self.records).map_err(|e| {
            build_failed("Failed to encode index vectors", e.to_string())
        })?;
        let manifest = serde_json::to_vec_pretty(&self.manifest).map_err(|e| {
            build_failed("Failed to encode index manifest", e.to_string())
        })?;
        write_atomic(&dir.join(VECTORS_FILE), &vectors)?;
        write_atomic(&dir.join(MANIFEST_FILE), &manifest)?;
        Ok(())
    }

    /// Load an index built with `expected_model`.
    ///
    /// Every failure (missing directory, undecodable files, model or shape mismatch) is
    /// reported as `INDEX_UNAVAILABLE`.
    pub fn load(dir: &Path, expected_model: &str) -> Result<Self, AppError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = fs::read(&manifest_path)
            .map_err(|e| unavailable("Vector index not found; run ingestion first", dir, e))?;
        let manifest: IndexManifest = serde_json::from_slice(&raw)
            .map_err(|e| unavailable("Failed to decode index manifest", dir, e))?;

        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(unavailable(
                "Unsupported index format; rebuild the index",
                dir,
                format!("format_version={}", manifest.format_version),
            ));
        }
        if manifest.model != expected_model {
            return Err(unavailable(
                "Index was built with a different embedding model; rebuild the index",
                dir,
                format!("index_model={}; current_model={}", manifest.model, expected_model),
            ));
        }

        let raw = fs::read(dir.join(VECTORS_FILE))
            .map_err(|e| unavailable("Index vectors missing; rebuild the index", dir, e))?;
        let records: Vec<IndexRecord> = serde_json::from_slice(&raw)
            .map_err(|e| unavailable("Failed to decode index vectors", dir, e))?;

        if records.len() != manifest.chunk_count as usize {
            return Err(unavailable(
                "Index manifest does not match stored vectors",
                dir,
                format!("manifest={}; stored={}", manifest.chunk_count, records.len()),
            ));
        }
        if let Some(bad) = records
            .iter()
            .find(|r| r.vector.len() != manifest.dims as usize)
        {
            return Err(unavailable(
                "Index vector dims mismatch",
                dir,
                format!(
                    "chunk_id={}; expected={}; got={}",
                    bad.chunk.chunk_id,
                    manifest.dims,
                    bad.vector.len()
                ),
            ));
        }

        tracing::debug!(
            path = %dir.display(),
            chunks = records.len(),
            dims = manifest.dims,
            "vector index loaded"
        );
        Ok(Self { manifest, records })
    }

    /// Top-`k` chunks by cosine similarity, descending, ties by `chunk_id` ascending.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievalHit>, AppError> {
        if vector.len() != self.manifest.dims as usize {
            return Err(AppError::new(
                codes::INDEX_UNAVAILABLE,
                "Query embedding dims do not match index dims",
            )
            .with_details(format!(
                "index_dims={}; query_dims={}",
                self.manifest.dims,
                vector.len()
            )));
        }
        let q_norm = norm(vector);
        if q_norm == 0.0 {
            return Ok(Vec::new());
        }

        let mut scored = self
            .records
            .iter()
            .filter_map(|r| cosine(vector, q_norm, &r.vector).map(|s| (r, s)))
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then(a.0.chunk.chunk_id.cmp(&b.0.chunk.chunk_id))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(r, score)| RetrievalHit {
                chunk: r.chunk.clone(),
                score,
            })
            .collect())
    }
}

/// Embed `chunks` and write a fresh index artifact to `dir`.
///
/// This is the producer side of the corpus: it runs out of band, never per query.
pub fn build_index_with_embedder(
    chunks: Vec<Chunk>,
    embedder: &dyn Embedder,
    dir: &Path,
    built_at: &str,
) -> Result<IndexManifest, AppError> {
    if chunks.is_empty() {
        return Err(build_failed(
            "No chunks available; add documents before building the index",
            format!("path={}", dir.display()),
        ));
    }

    let total = chunks.len();
    let mut embeddings = Vec::with_capacity(total);
    for (i, chunk) in chunks.iter().enumerate() {
        let v = embedder.embed(&chunk.text).map_err(|e| {
            AppError::new(codes::EMBEDDINGS_FAILED, "Failed to compute embeddings")
                .with_details(format!("chunk_id={}; err={}", chunk.chunk_id, e))
                .with_retryable(e.retryable)
        })?;
        embeddings.push(v);
        if (i + 1) % 50 == 0 {
            tracing::info!(embedded = i + 1, total, "embedding chunks");
        }
    }

    let index = VectorIndex::build(chunks, embeddings, embedder.model(), built_at)?;
    index.save(dir)?;
    tracing::info!(
        path = %dir.display(),
        chunks = index.len(),
        dims = index.manifest().dims,
        model = %index.manifest().model,
        "vector index written"
    );
    Ok(index.manifest().clone())
}
