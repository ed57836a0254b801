//! Error types for Sift.

use crate::llm_client::LlmError;
use thiserror::Error;

/// Failure raised by a statement executor.
///
/// The structured-query pipeline catches these and turns them into a
/// `System Error: ...` answer; they never reach the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataAccessError {
    #[error("{0}")]
    Statement(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Request-level failure: a collaborator could not be reached or used.
///
/// Only these abort the current request. Guardrail rejections and execution
/// failures are answers, not errors.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),
}

impl SiftError {
    /// Short label for request logs
    pub fn kind(&self) -> &'static str {
        match self {
            SiftError::Llm(_) => "llm",
            SiftError::Schema(_) => "schema",
            SiftError::Retrieval(_) => "retrieval",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_access_error_display() {
        let err = DataAccessError::Statement("no such table: orderz".to_string());
        assert_eq!(err.to_string(), "no such table: orderz");

        let err = DataAccessError::Connection("database is locked".to_string());
        assert_eq!(err.to_string(), "connection error: database is locked");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(SiftError::Schema("down".to_string()).kind(), "schema");
        assert_eq!(SiftError::Retrieval("down".to_string()).kind(), "retrieval");
    }

    #[test]
    fn test_sift_error_from_llm() {
        let err: SiftError = LlmError::Timeout(30).into();
        assert_eq!(err.kind(), "llm");
        assert!(err.to_string().contains("30 seconds"));
    }
}
