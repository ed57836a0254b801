//! Structured-Query Pipeline
//!
//! ```text
//! schema → generate SQL → strip fences → guardrail → execute → narrate
//!                                           │            │
//!                                        Blocked   ExecutionFailed
//! ```
//!
//! Steps run strictly in this order. Guardrail rejections and execution
//! failures become sentinel answers; only collaborator failures (schema,
//! generation, narration) are returned as errors.

use crate::database::{SchemaProvider, StatementExecutor};
use crate::error::SiftError;
use crate::guardrail::{self, GuardrailVerdict};
use crate::llm_client::{PromptVars, TextCompletion};
use crate::prompts::{NARRATION_PROMPT, SQL_GENERATION_PROMPT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer returned when the guardrail rejects a generated statement
pub const BLOCKED_SENTINEL: &str = "ERROR: Unsafe database operation blocked.";

/// Prefix of the answer returned when execution fails
pub const EXECUTION_ERROR_PREFIX: &str = "System Error: ";

/// How a structured request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SqlOutcome {
    Answered { statement: String, narration: String },
    Blocked { statement: String, keyword: String },
    ExecutionFailed { statement: String, error: String },
}

impl SqlOutcome {
    /// The generated statement, whatever the outcome
    pub fn statement(&self) -> &str {
        match self {
            SqlOutcome::Answered { statement, .. }
            | SqlOutcome::Blocked { statement, .. }
            | SqlOutcome::ExecutionFailed { statement, .. } => statement,
        }
    }

    /// User-visible answer text
    pub fn into_text(self) -> String {
        match self {
            SqlOutcome::Answered { narration, .. } => narration,
            SqlOutcome::Blocked { .. } => BLOCKED_SENTINEL.to_string(),
            SqlOutcome::ExecutionFailed { error, .. } => {
                format!("{}{}", EXECUTION_ERROR_PREFIX, error)
            }
        }
    }
}

/// Remove markdown code fences and surrounding whitespace. A single word
/// running from a fence to the end of its line (`sql`, `sqlite3`, `tsql`)
/// is an info string and is dropped with the fence. Text without fences is
/// only trimmed.
pub fn strip_code_fences(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];

        if let Some(line_end) = rest.find('\n') {
            let info = rest[..line_end].trim();
            if is_info_string(info) {
                rest = &rest[line_end..];
            }
        }
    }

    out.push_str(rest);
    out.trim().to_string()
}

fn is_info_string(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
}

/// Generates, validates, executes and narrates SQL for a question
pub struct StructuredQueryPipeline {
    llm: Arc<dyn TextCompletion>,
    schema: Arc<dyn SchemaProvider>,
    executor: Arc<dyn StatementExecutor>,
}

impl StructuredQueryPipeline {
    pub fn new(
        llm: Arc<dyn TextCompletion>,
        schema: Arc<dyn SchemaProvider>,
        executor: Arc<dyn StatementExecutor>,
    ) -> Self {
        Self {
            llm,
            schema,
            executor,
        }
    }

    /// Run the pipeline and report how it ended
    pub fn run(&self, question: &str) -> Result<SqlOutcome, SiftError> {
        // 1. Schema, fetched fresh per request
        let schema = self.schema.describe_schema()?;

        // 2. Generate and normalise
        let vars = PromptVars::new()
            .with("schema", schema)
            .with("question", question);
        let generated = self.llm.complete(&SQL_GENERATION_PROMPT, &vars)?;
        let statement = strip_code_fences(&generated);
        debug!(%statement, "Generated SQL");

        // 3. Guardrail
        if let GuardrailVerdict::Rejected { keyword } = guardrail::check(&statement) {
            warn!(%keyword, %statement, "Guardrail blocked statement");
            return Ok(SqlOutcome::Blocked { statement, keyword });
        }

        // 4. Execute
        let result = match self.executor.execute(&statement) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, %statement, "Statement execution failed");
                return Ok(SqlOutcome::ExecutionFailed {
                    statement,
                    error: e.to_string(),
                });
            }
        };

        // 5. Narrate
        let vars = PromptVars::new()
            .with("result", result)
            .with("question", question);
        let narration = self.llm.complete(&NARRATION_PROMPT, &vars)?;
        info!(%statement, "Structured query answered");

        Ok(SqlOutcome::Answered {
            statement,
            narration,
        })
    }

    /// Answer text for `question`
    pub fn answer(&self, question: &str) -> Result<String, SiftError> {
        self.run(question).map(SqlOutcome::into_text)
    }
}
