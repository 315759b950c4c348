use std::time::Duration;

use sbot_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::http::{decode_error, request_error};

/// Client for OpenAI-compatible `/chat/completions` endpoints (Groq, OpenAI, vLLM, ...).
#[derive(Debug, Clone)]
pub struct OpenAiCompatLlm {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiCompatLlm {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(AppError::new(
                codes::REMOTE_URL_INVALID,
                "LLM base URL must be an http(s) URL",
            )
            .with_details(format!("base_url={base_url}")));
        }
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::new(codes::LLM_FAILED, "LLM API key is not configured")
                    .with_details("set GROQ_API_KEY")
            })?;
        Ok(Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            timeout,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl Llm for OpenAiCompatLlm {
    fn invoke(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(req)
            .map_err(|e| request_error(codes::LLM_FAILED, "chat completion", e))?;
        let v: ChatResponse = resp
            .into_json()
            .map_err(|e| decode_error(codes::LLM_FAILED, "chat completion", e))?;

        let content = v
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AppError::new(codes::LLM_FAILED, "Chat completion was empty")
                .with_details(format!("model={}", self.model)));
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key_and_http_url() {
        let t = Duration::from_secs(1);
        let err = OpenAiCompatLlm::new("https://api.groq.com/openai/v1", None, "m", 0.7, t)
            .expect_err("missing key");
        assert_eq!(err.code, codes::LLM_FAILED);
        assert!(OpenAiCompatLlm::new("https://api.groq.com/openai/v1", Some("  "), "m", 0.7, t).is_err());
        assert!(OpenAiCompatLlm::new("ftp://x", Some("k"), "m", 0.7, t).is_err());
        assert!(OpenAiCompatLlm::new("https://api.groq.com/openai/v1/", Some("k"), "m", 0.7, t).is_ok());
    }
}
