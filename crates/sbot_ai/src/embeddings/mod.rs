use sbot_core::error::AppError;

/// Maps text to a fixed-dimension vector. The same model must be used to build an index and
/// to query it; `model()` is recorded in the index manifest to enforce that.
pub trait Embedder: Send + Sync {
    fn model(&self) -> &str;
    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod ollama_embed;

pub use ollama_embed::OllamaEmbedder;
