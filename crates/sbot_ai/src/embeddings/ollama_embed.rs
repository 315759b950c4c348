use std::time::Duration;

use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::http::{decode_error, request_error};
use crate::ollama::OllamaClient;

const MAX_INPUT_CHARS: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    timeout: Duration,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: &str, timeout: Duration) -> Self {
        Self {
            client,
            model: model.to_string(),
            timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        // Chunks are small; queries are user-typed. Bound the request anyway.
        let prompt = match input.char_indices().nth(MAX_INPUT_CHARS) {
            Some((idx, _)) => &input[..idx],
            None => input,
        };

        let url = format!("{}/api/embeddings", self.client.base_url());
        let req = EmbeddingsRequest {
            model: &self.model,
            prompt,
        };
        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(req)
            .map_err(|e| request_error(codes::EMBEDDINGS_FAILED, "embeddings", e))?;
        let v: EmbeddingsResponse = resp
            .into_json()
            .map_err(|e| decode_error(codes::EMBEDDINGS_FAILED, "embeddings", e))?;
        if v.embedding.is_empty() {
            return Err(AppError::new(
                codes::EMBEDDINGS_FAILED,
                "Embeddings response was empty",
            )
            .with_details(format!("model={}", self.model)));
        }
        Ok(v.embedding)
    }
}
