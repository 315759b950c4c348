//! The answer pipeline: corpus first, confidence gate, web fallback.
//!
//! ```text
//! Init -> RetrievingCorpus -> EvaluatingConfidence -> Done
//!                                                  \-> FallingBackToWeb -> Done
//! ```
//!
//! Every step runs sequentially on the caller's thread. Nothing is retried; the first error
//! that is not covered by the index policy aborts the invocation.

use sbot_core::config::IndexPolicy;
use sbot_core::domain::{Answer, AnswerOrigin, FallbackReason, PipelineStage, Query, ResponseMode};
use sbot_core::error::{codes, AppError};
use sbot_core::normalize::strip_markdown_emphasis;

use crate::fallback::WebFallback;
use crate::gate::{ConfidencePolicy, MarkerGate};
use crate::retrieve::Retriever;
use crate::synth::AnswerSynthesizer;

pub struct AnswerPipeline<'a> {
    retriever: Retriever<'a>,
    synthesizer: AnswerSynthesizer<'a>,
    gate: Box<dyn ConfidencePolicy + 'a>,
    fallback: WebFallback<'a>,
    index_policy: IndexPolicy,
}

impl<'a> AnswerPipeline<'a> {
    pub fn new(
        retriever: Retriever<'a>,
        synthesizer: AnswerSynthesizer<'a>,
        fallback: WebFallback<'a>,
    ) -> Self {
        Self {
            retriever,
            synthesizer,
            gate: Box::new(MarkerGate::default()),
            fallback,
            index_policy: IndexPolicy::default(),
        }
    }

    pub fn with_gate(mut self, gate: Box<dyn ConfidencePolicy + 'a>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_index_policy(mut self, policy: IndexPolicy) -> Self {
        self.index_policy = policy;
        self
    }

    fn corpus_answer(&self, query: &str, mode: ResponseMode) -> Result<String, AppError> {
        let context = self.retriever.retrieve(query)?;
        self.synthesizer.synthesize(query, &context, mode)
    }

    pub fn answer(&self, query: &Query) -> Result<Answer, AppError> {
        let text = query.text.trim();
        if text.is_empty() {
            return Err(AppError::new(codes::QUERY_INVALID, "Query must not be empty"));
        }
        let mode = query.mode;
        let mut trace = vec![PipelineStage::Init];

        trace.push(PipelineStage::RetrievingCorpus);
        tracing::info!(%mode, "answering from corpus");
        let mut index_missing = false;
        let corpus = match self.corpus_answer(text, mode) {
            Ok(answer) => answer,
            Err(e) if e.is(codes::INDEX_UNAVAILABLE) && self.index_policy == IndexPolicy::Fallback => {
                tracing::warn!(error = %e, "vector index unavailable; treating corpus answer as empty");
                index_missing = true;
                String::new()
            }
            Err(e) => return Err(e),
        };

        trace.push(PipelineStage::EvaluatingConfidence);
        if !index_missing && self.gate.is_confident(&corpus) {
            trace.push(PipelineStage::Done);
            tracing::info!(origin = "corpus", "answer ready");
            return Ok(Answer {
                text: finalize(&corpus),
                origin: AnswerOrigin::Corpus,
                mode,
                fallback_reason: None,
                trace,
            });
        }

        let reason = if index_missing {
            FallbackReason::IndexUnavailable
        } else {
            FallbackReason::LowConfidence
        };
        trace.push(PipelineStage::FallingBackToWeb);
        tracing::info!(?reason, "corpus answer not confident; falling back to web search");
        let web = self.fallback.fallback_answer(text, mode)?;

        trace.push(PipelineStage::Done);
        tracing::info!(origin = "web", "answer ready");
        Ok(Answer {
            text: finalize(&web),
            origin: AnswerOrigin::Web,
            mode,
            fallback_reason: Some(reason),
            trace,
        })
    }
}

fn finalize(text: &str) -> String {
    strip_markdown_emphasis(text.trim())
}
