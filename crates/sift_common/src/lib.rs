//! Sift Common - routing, guardrail and answering pipelines for Sift
//!
//! A question is classified by the [`router`], then answered either by the
//! structured-query pipeline (generate SQL, guard it, execute it, narrate it)
//! or by the retrieval pipeline (answer from ranked passages only).
//! Collaborators (language model, database, retriever) are injected through
//! the traits in [`llm_client`], [`database`] and [`knowledge`].

pub mod config;
pub mod database;
pub mod dispatch;
pub mod error;
pub mod guardrail;
pub mod knowledge;
pub mod llm_client;
pub mod prompts;
pub mod rag_pipeline;
pub mod router;
pub mod sql_pipeline;

pub use config::SiftConfig;
pub use dispatch::{Answer, Collaborators, DispatchController, REFUSAL_TEXT};
pub use error::{DataAccessError, SiftError};
pub use guardrail::{is_safe, GuardrailVerdict};
pub use llm_client::{LlmError, PromptTemplate, PromptVars, TextCompletion};
pub use rag_pipeline::{RetrievalPipeline, NOT_AVAILABLE_SENTINEL};
pub use router::{resolve_intent, Intent, Router};
pub use sql_pipeline::{SqlOutcome, StructuredQueryPipeline, BLOCKED_SENTINEL};
