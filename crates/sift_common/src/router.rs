//! Router - Question Intent Classifier
//!
//! Asks the completion model for a single routing word and resolves the
//! free-form reply into an [`Intent`].
//!
//! ## Flow
//!
//! ```text
//! Question → ROUTER_PROMPT → model reply ("Decision: SQL") → resolve_intent → Intent
//! ```
//!
//! Resolution is substring based and checks "SQL" before "RAG", so a reply
//! mentioning both routes to the structured path. That ordering comes from the
//! routing prompt rather than a business rule.

use crate::error::SiftError;
use crate::llm_client::{PromptVars, TextCompletion};
use crate::prompts::ROUTER_PROMPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Intent
// ============================================================================

/// Which answering strategy handles a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Generate and run a data-access statement
    Structured,
    /// Answer from retrieved passages
    Unstructured,
    /// Neither; answered with the fixed refusal
    Unsupported,
}

impl Intent {
    /// Path label used in logs and CLI output
    pub fn path_label(&self) -> &'static str {
        match self {
            Intent::Structured => "SQL",
            Intent::Unstructured => "RAG",
            Intent::Unsupported => "NONE",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_label())
    }
}

/// Map raw router output to an intent.
///
/// Case and surrounding text are ignored. Anything that contains neither
/// "SQL" nor "RAG" (including an empty reply) is `Unsupported`.
pub fn resolve_intent(raw: &str) -> Intent {
    let decision = raw.trim().to_uppercase();

    if decision.contains("SQL") {
        Intent::Structured
    } else if decision.contains("RAG") {
        Intent::Unstructured
    } else {
        Intent::Unsupported
    }
}

// ============================================================================
// Router
// ============================================================================

/// Classifies questions using the completion collaborator
pub struct Router {
    llm: Arc<dyn TextCompletion>,
}

impl Router {
    pub fn new(llm: Arc<dyn TextCompletion>) -> Self {
        Self { llm }
    }

    /// One completion call, no retries.
    pub fn classify(&self, question: &str) -> Result<Intent, SiftError> {
        let vars = PromptVars::new().with("question", question);
        let raw = self.llm.complete(&ROUTER_PROMPT, &vars)?;
        let intent = resolve_intent(&raw);

        tracing::debug!(raw = %raw.trim(), intent = %intent, "Router decision");
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{FakeCompletionClient, LlmError};

    #[test]
    fn test_resolve_exact_words() {
        assert_eq!(resolve_intent("SQL"), Intent::Structured);
        assert_eq!(resolve_intent("RAG"), Intent::Unstructured);
        assert_eq!(resolve_intent("NONE"), Intent::Unsupported);
    }

    #[test]
    fn test_resolve_surrounding_text_and_case() {
        assert_eq!(resolve_intent("Decision: SQL please"), Intent::Structured);
        assert_eq!(resolve_intent("  sql\n"), Intent::Structured);
        assert_eq!(resolve_intent("I think 'rag'."), Intent::Unstructured);
        assert_eq!(resolve_intent("Hello!"), Intent::Unsupported);
        assert_eq!(resolve_intent(""), Intent::Unsupported);
        assert_eq!(resolve_intent("   "), Intent::Unsupported);
    }

    #[test]
    fn test_resolve_sql_wins_over_rag() {
        assert_eq!(resolve_intent("RAG or SQL?"), Intent::Structured);
        assert_eq!(resolve_intent("SQL, maybe RAG"), Intent::Structured);
    }

    #[test]
    fn test_resolve_substring_inside_words() {
        // Plain substring search: "MYSQL" and "FRAGMENT" still match
        assert_eq!(resolve_intent("mysql"), Intent::Structured);
        assert_eq!(resolve_intent("fragment"), Intent::Unstructured);
    }

    #[test]
    fn test_path_labels() {
        assert_eq!(Intent::Structured.to_string(), "SQL");
        assert_eq!(Intent::Unstructured.to_string(), "RAG");
        assert_eq!(Intent::Unsupported.to_string(), "NONE");
    }

    #[test]
    fn test_classify_uses_router_prompt() {
        let llm = Arc::new(FakeCompletionClient::with_replies(&["Decision: RAG"]));
        let router = Router::new(llm.clone());

        let intent = router.classify("What is your return policy?").unwrap();
        assert_eq!(intent, Intent::Unstructured);
        assert_eq!(llm.templates_used(), vec!["router"]);
        assert!(llm.prompts()[0].contains("Question: What is your return policy?\nDecision:"));
    }

    #[test]
    fn test_classify_propagates_llm_failure() {
        let llm = Arc::new(FakeCompletionClient::always_error(LlmError::Timeout(5)));
        let router = Router::new(llm);

        let err = router.classify("anything").unwrap_err();
        assert!(matches!(err, SiftError::Llm(LlmError::Timeout(5))));
    }
}
