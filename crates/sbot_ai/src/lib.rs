pub mod embeddings;
pub mod fallback;
pub mod gate;
mod http;
pub mod index;
pub mod llm;
pub mod news;
pub mod ollama;
pub mod pipeline;
pub mod prompts;
pub mod retrieve;
pub mod search;
pub mod synth;
