use sbot_core::domain::ResponseMode;

use crate::retrieve::RetrievalResult;

/// Phrase the corpus templates ask the model to emit when the context does not cover the
/// question. The confidence gate keys on it.
pub const NO_ANSWER_SENTINEL: &str = "I don't know based on the provided context";

/// Mode-specific wording for both answer paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub mode: ResponseMode,
    corpus_instructions: &'static str,
    web_instructions: &'static str,
}

const PERSONA: &str = "You are SustainaBOT, an expert in sustainable energy and carbon emissions.";

static CONCISE: PromptTemplate = PromptTemplate {
    mode: ResponseMode::Concise,
    corpus_instructions: "Using the context provided, give a brief and concise answer to the question.
Include only the essential points and avoid unnecessary elaboration.
Your goal is to communicate efficiently without missing key insights.",
    web_instructions: "Summarize the following web search results into a short and clear paragraph",
};

static DETAILED: PromptTemplate = PromptTemplate {
    mode: ResponseMode::Detailed,
    corpus_instructions: "Using the context provided, generate a structured and comprehensive response to the question, following the format below:

1. Domain Knowledge: Briefly explain the relevant background or domain-specific concepts required to understand the answer.
2. Solution/Analysis: Provide a deep, well-reasoned explanation addressing the question using the context provided.
3. Conclusion: Summarize the key takeaway or implication based on the above analysis.

Be precise, informative, and maintain a professional tone. Avoid redundancy and do not assume any information not found in the context.",
    web_instructions: "Using the following web search results, provide a detailed and structured explanation",
};

impl PromptTemplate {
    pub fn for_mode(mode: ResponseMode) -> &'static PromptTemplate {
        match mode {
            ResponseMode::Concise => &CONCISE,
            ResponseMode::Detailed => &DETAILED,
        }
    }

    /// Grounded prompt over retrieved corpus context.
    pub fn render_corpus(&self, context: &str, question: &str) -> String {
        format!(
            r#"{PERSONA}

{instructions}
Answer only from the context below.
If the context doesn't contain information relevant to the question, respond with '{NO_ANSWER_SENTINEL}.'

Context:
{context}

Question: {question}
"#,
            instructions = self.corpus_instructions,
        )
    }

    /// Final answer prompt over condensed web search text.
    pub fn render_web(&self, search_text: &str, question: &str) -> String {
        format!(
            r#"You are an AI assistant. {instructions} answering the query: '{question}'.

Search Results:
{search_text}
"#,
            instructions = self.web_instructions,
        )
    }
}

/// Numbered context blocks, one per retrieved chunk.
pub fn render_context(result: &RetrievalResult) -> String {
    result
        .hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let c = &hit.chunk;
            let page = c
                .page
                .map(|p| format!(" page={p}"))
                .unwrap_or_default();
            format!(
                "[{}] source={}{} offset={}\n{}",
                i + 1,
                c.parent_source_id,
                page,
                c.offset,
                c.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Domain-focused pre-summary of raw search contents.
pub fn condense_prompt(query: &str, results: &str) -> String {
    format!(
        "You are an expert sustainability analyst. Given the following search results, write a concise, domain-relevant summary (based on the user's query topic). \
Focus on industry-specific insights, sustainability practices, and real data, avoiding generic suggestions.\n\n\
User Query: {query}\n\nSearch Results:\n{results}"
    )
}

pub fn news_prompt(formatted_results: &str, limit: usize) -> String {
    format!(
        r#"You are a sustainability news curator. Based on the following search results, create a list of the TOP {limit} most important and recent news items about renewable energy and sustainability.

For each news item:
1. Create a clear, informative headline (bold)
2. Write a 2-3 sentence summary of the news
3. Include the approximate date if available
4. Include the source URL at the end of each item
5. Format as a numbered list with emoji indicators

Search Results:
{formatted_results}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_resolved_by_mode() {
        assert_eq!(PromptTemplate::for_mode(ResponseMode::Concise).mode, ResponseMode::Concise);
        assert_eq!(PromptTemplate::for_mode(ResponseMode::Detailed).mode, ResponseMode::Detailed);
    }

    #[test]
    fn both_corpus_templates_carry_the_sentinel() {
        for mode in [ResponseMode::Concise, ResponseMode::Detailed] {
            let p = PromptTemplate::for_mode(mode).render_corpus("ctx", "q?");
            assert!(p.contains(NO_ANSWER_SENTINEL));
            assert!(p.contains("Context:\nctx"));
            assert!(p.contains("Question: q?"));
        }
    }
}
