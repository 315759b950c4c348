use std::time::Duration;

use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::http::{decode_error, request_error};
use crate::ollama::OllamaClient;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient, model: &str, temperature: f32, timeout: Duration) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
            timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Llm for OllamaLlm {
    fn invoke(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/api/generate", self.client.base_url());
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .send_json(req)
            .map_err(|e| request_error(codes::LLM_FAILED, "generate", e))?;
        let v: GenerateResponse = resp
            .into_json()
            .map_err(|e| decode_error(codes::LLM_FAILED, "generate", e))?;
        if v.response.trim().is_empty() {
            return Err(AppError::new(codes::LLM_FAILED, "Generate response was empty")
                .with_details(format!("model={}", self.model)));
        }
        Ok(v.response)
    }
}
