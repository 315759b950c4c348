//! Confidence gate: decides whether a corpus answer can be returned as-is.

use crate::prompts::NO_ANSWER_SENTINEL;

/// Lower-cased markers of a non-answer. Matching is by substring, so a real answer that
/// quotes one of these phrases is also routed to the web.
pub const LOW_CONFIDENCE_MARKERS: [&str; 6] = [
    "not mention",
    "out of context",
    "cannot answer",
    "no information",
    "this context is about",
    "the question seems to be out of context",
];

/// Pluggable confidence strategy.
pub trait ConfidencePolicy: Send + Sync {
    fn is_confident(&self, answer: &str) -> bool;
}

/// Case-insensitive substring matcher over a fixed marker list.
#[derive(Debug, Clone)]
pub struct MarkerGate {
    markers: Vec<String>,
}

impl Default for MarkerGate {
    fn default() -> Self {
        let mut markers = vec![NO_ANSWER_SENTINEL.to_lowercase()];
        markers.extend(LOW_CONFIDENCE_MARKERS.iter().map(|m| m.to_string()));
        Self { markers }
    }
}

impl MarkerGate {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl ConfidencePolicy for MarkerGate {
    fn is_confident(&self, answer: &str) -> bool {
        if answer.is_empty() {
            return false;
        }
        let lower = answer.to_lowercase();
        !self.markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

/// Default gate.
pub fn is_confident(answer: &str) -> bool {
    MarkerGate::default().is_confident(answer)
}
