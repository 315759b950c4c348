use sbot_core::domain::ResponseMode;
use sbot_core::error::AppError;

use crate::llm::Llm;
use crate::prompts::{render_context, PromptTemplate, NO_ANSWER_SENTINEL};
use crate::retrieve::RetrievalResult;

/// Grounded answer generation over retrieved corpus chunks.
pub struct AnswerSynthesizer<'a> {
    llm: &'a dyn Llm,
}

impl<'a> AnswerSynthesizer<'a> {
    pub fn new(llm: &'a dyn Llm) -> Self {
        Self { llm }
    }

    /// Render the mode's template over `context` and ask the model once.
    ///
    /// An empty retrieval result short-circuits to the sentinel without a model call.
    pub fn synthesize(
        &self,
        query: &str,
        context: &RetrievalResult,
        mode: ResponseMode,
    ) -> Result<String, AppError> {
        if context.is_empty() {
            tracing::debug!("no corpus context; returning sentinel");
            return Ok(format!("{NO_ANSWER_SENTINEL}."));
        }
        let prompt = PromptTemplate::for_mode(mode).render_corpus(&render_context(context), query);
        self.llm.invoke(&prompt)
    }
}
