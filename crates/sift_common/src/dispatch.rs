//! Dispatch Controller
//!
//! ```text
//! question → Router ─┬─ SQL  → StructuredQueryPipeline
//!                    ├─ RAG  → RetrievalPipeline
//!                    └─ NONE → REFUSAL_TEXT
//! ```
//!
//! One pass per question: classify, then run exactly one branch.

use crate::database::{SchemaProvider, StatementExecutor};
use crate::error::SiftError;
use crate::knowledge::Retriever;
use crate::llm_client::TextCompletion;
use crate::rag_pipeline::RetrievalPipeline;
use crate::router::{Intent, Router};
use crate::sql_pipeline::StructuredQueryPipeline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Fixed answer for questions neither path can handle
pub const REFUSAL_TEXT: &str = "I am sorry, but I can only answer questions based on my provided documents (RAG) or database (SQL). I don't have information on this specific query.";

/// Final answer and the path that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub path: Intent,
    pub text: String,
}

/// Long-lived collaborator handles, created once at startup
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn TextCompletion>,
    pub schema: Arc<dyn SchemaProvider>,
    pub executor: Arc<dyn StatementExecutor>,
    pub retriever: Arc<dyn Retriever>,
}

pub struct DispatchController {
    router: Router,
    structured: StructuredQueryPipeline,
    retrieval: RetrievalPipeline,
}

impl DispatchController {
    pub fn new(
        router: Router,
        structured: StructuredQueryPipeline,
        retrieval: RetrievalPipeline,
    ) -> Self {
        Self {
            router,
            structured,
            retrieval,
        }
    }

    /// Wire router and pipelines over one set of collaborators
    pub fn from_collaborators(c: Collaborators) -> Self {
        Self::new(
            Router::new(c.llm.clone()),
            StructuredQueryPipeline::new(c.llm.clone(), c.schema, c.executor),
            RetrievalPipeline::new(c.llm, c.retriever),
        )
    }

    /// Classify and answer a question.
    ///
    /// Errors only when a collaborator is unavailable; guarded and failed
    /// statements still produce an `Answer`.
    pub fn handle(&self, question: &str) -> Result<Answer, SiftError> {
        let path = self.router.classify(question)?;
        info!(path = %path, "Path selected -> {}", path);

        let text = match path {
            Intent::Structured => self.structured.answer(question)?,
            Intent::Unstructured => self.retrieval.answer(question)?,
            Intent::Unsupported => REFUSAL_TEXT.to_string(),
        };

        Ok(Answer { path, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::FakeDatabase;
    use crate::knowledge::StaticRetriever;
    use crate::llm_client::FakeCompletionClient;

    fn controller(
        llm: &Arc<FakeCompletionClient>,
        db: &Arc<FakeDatabase>,
        retriever: &Arc<StaticRetriever>,
    ) -> DispatchController {
        DispatchController::from_collaborators(Collaborators {
            llm: llm.clone(),
            schema: db.clone(),
            executor: db.clone(),
            retriever: retriever.clone(),
        })
    }

    #[test]
    fn test_unsupported_is_refused_without_collaborators() {
        let llm = Arc::new(FakeCompletionClient::with_replies(&["NONE"]));
        let db = Arc::new(FakeDatabase::new("", Ok(String::new())));
        let retriever = Arc::new(StaticRetriever::new(&["passage"]));

        let answer = controller(&llm, &db, &retriever).handle("hi there").unwrap();
        assert_eq!(answer.path, Intent::Unsupported);
        assert_eq!(answer.text, REFUSAL_TEXT);
        assert_eq!(llm.call_count(), 1);
        assert_eq!(db.schema_calls(), 0);
        assert_eq!(db.execute_calls(), 0);
        assert_eq!(retriever.call_count(), 0);
    }

    #[test]
    fn test_rag_branch() {
        let llm = Arc::new(FakeCompletionClient::with_replies(&["RAG", "30 days."]));
        let db = Arc::new(FakeDatabase::new("", Ok(String::new())));
        let retriever = Arc::new(StaticRetriever::new(&["Return Policy: 30 days."]));

        let answer = controller(&llm, &db, &retriever)
            .handle("What is your return policy?")
            .unwrap();
        assert_eq!(
            answer,
            Answer {
                path: Intent::Unstructured,
                text: "30 days.".to_string()
            }
        );
        assert_eq!(db.schema_calls(), 0);
    }

    #[test]
    fn test_sql_branch() {
        let llm = Arc::new(FakeCompletionClient::with_replies(&[
            "SQL",
            "SELECT COUNT(*) FROM orders",
            "Three orders.",
        ]));
        let db = Arc::new(FakeDatabase::new("CREATE TABLE orders (id INTEGER)", Ok("[(3)]".to_string())));
        let retriever = Arc::new(StaticRetriever::empty());

        let answer = controller(&llm, &db, &retriever).handle("How many orders?").unwrap();
        assert_eq!(answer.path, Intent::Structured);
        assert_eq!(answer.text, "Three orders.");
        assert_eq!(retriever.call_count(), 0);
    }
}
