//! Retrieval Pipeline
//!
//! Answers from retrieved passages only. There is no mutation surface here,
//! so no guardrail runs on this path.

use crate::error::SiftError;
use crate::knowledge::Retriever;
use crate::llm_client::{PromptVars, TextCompletion};
use crate::prompts::RAG_PROMPT;
use std::sync::Arc;
use tracing::debug;

/// Answer when the context does not support one
pub const NOT_AVAILABLE_SENTINEL: &str = "Information not available";

/// Separator between passages in the prompt context
const PASSAGE_SEPARATOR: &str = "\n\n";

pub struct RetrievalPipeline {
    llm: Arc<dyn TextCompletion>,
    retriever: Arc<dyn Retriever>,
}

impl RetrievalPipeline {
    pub fn new(llm: Arc<dyn TextCompletion>, retriever: Arc<dyn Retriever>) -> Self {
        Self { llm, retriever }
    }

    /// Completion output is returned verbatim.
    ///
    /// With no passages at all the model is not consulted and
    /// [`NOT_AVAILABLE_SENTINEL`] is returned directly.
    pub fn answer(&self, question: &str) -> Result<String, SiftError> {
        let passages = self.retriever.search(question)?;
        debug!(passages = passages.len(), "Retrieved context");

        if passages.is_empty() {
            return Ok(NOT_AVAILABLE_SENTINEL.to_string());
        }

        let vars = PromptVars::new()
            .with("context", passages.join(PASSAGE_SEPARATOR))
            .with("question", question);
        Ok(self.llm.complete(&RAG_PROMPT, &vars)?)
    }
}
