use sbot_core::error::AppError;

/// Map a failed `ureq` call onto the caller's error code.
///
/// Timeouts and connection failures surface as transport errors and are marked retryable,
/// as are 429 and 5xx responses. Nothing is retried here.
pub(crate) fn request_error(code: &str, what: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            AppError::new(code, format!("{what} request failed"))
                .with_details(format!("status={status}; body={}", truncate_chars(&body, 300)))
                .with_retryable(status == 429 || status >= 500)
        }
        ureq::Error::Transport(t) => AppError::new(code, format!("Failed to call {what} endpoint"))
            .with_details(t.to_string())
            .with_retryable(true),
    }
}

pub(crate) fn decode_error(code: &str, what: &str, err: std::io::Error) -> AppError {
    AppError::new(code, format!("Failed to decode {what} response")).with_details(err.to_string())
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
