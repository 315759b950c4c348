use sbot_core::error::AppError;

/// Language model port. One call, one completion; implementations never retry.
///
/// Implementations must be safe to share across threads.
pub trait Llm: Send + Sync {
    fn invoke(&self, prompt: &str) -> Result<String, AppError>;
}

pub mod ollama_llm;
pub mod openai_compat;

pub use ollama_llm::OllamaLlm;
pub use openai_compat::OpenAiCompatLlm;
