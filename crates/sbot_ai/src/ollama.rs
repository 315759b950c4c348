use sbot_core::error::{codes, AppError};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

fn invalid(base_url: &str) -> AppError {
    AppError::new(
        codes::REMOTE_URL_INVALID,
        "Ollama base URL must be http://127.0.0.1 or http://localhost with an optional port",
    )
    .with_details(format!("base_url={base_url}"))
}

impl OllamaClient {
    /// Create a client for a local Ollama daemon. Only loopback hosts are accepted.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        let authority = base_url
            .strip_prefix("http://")
            .ok_or_else(|| invalid(&base_url))?;
        // No userinfo, path, query or fragment.
        if authority.contains(['@', '/', '?', '#']) {
            return Err(invalid(&base_url));
        }
        let (host, port) = match authority.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (authority, None),
        };
        if host != "127.0.0.1" && host != "localhost" {
            return Err(invalid(&base_url));
        }
        if let Some(p) = port {
            match p.parse::<u16>() {
                Ok(n) if n != 0 => {}
                _ => return Err(invalid(&base_url)),
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url)
            .timeout(std::time::Duration::from_millis(800))
            .call();

        match resp {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                codes::EMBEDDINGS_FAILED,
                "Ollama health check failed",
            )
            .with_details(format!("status={status}"))),
            Err(e) => Err(AppError::new(
                codes::EMBEDDINGS_FAILED,
                "Failed to reach Ollama",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}
