//! Logging for siftctl
//!
//! Two outputs:
//! - `tracing` events to stderr, filtered by `SIFT_LOG` (default `warn`)
//! - one JSONL request record per answered question, XDG-compliant path

use serde::{Deserialize, Serialize};
use sift_common::{Answer, SiftError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Env var holding the tracing filter
pub const LOG_FILTER_ENV: &str = "SIFT_LOG";

/// Install the stderr subscriber. `verbose` forces debug level.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Request record for requests.jsonl
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestLogEntry {
    /// ISO 8601 timestamp
    pub ts: String,

    /// Request ID (UUID)
    pub req_id: String,

    pub question: String,

    /// SQL / RAG / NONE; absent when routing itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub ok: bool,

    pub duration_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub kind: String,
    pub message: String,
}

impl RequestLogEntry {
    pub fn from_result(
        req_id: &str,
        question: &str,
        result: &Result<Answer, SiftError>,
        duration_ms: u64,
    ) -> Self {
        let (path, error) = match result {
            Ok(answer) => (Some(answer.path.path_label().to_string()), None),
            Err(e) => (
                None,
                Some(ErrorDetails {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                }),
            ),
        };

        Self {
            ts: Self::now(),
            req_id: req_id.to_string(),
            question: question.to_string(),
            path,
            ok: result.is_ok(),
            duration_ms,
            error,
        }
    }

    /// Discover log file path with fallback chain
    ///
    /// Priority:
    /// 1. $SIFT_LOG_FILE (explicit override)
    /// 2. $XDG_STATE_HOME/sift/requests.jsonl
    /// 3. ~/.local/state/sift/requests.jsonl
    pub fn discover_log_path<F>(lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SIFT_LOG_FILE") {
            return Some(PathBuf::from(path));
        }

        if let Some(xdg_state) = lookup("XDG_STATE_HOME") {
            return Some(PathBuf::from(xdg_state).join("sift").join("requests.jsonl"));
        }

        lookup("HOME").map(|home| {
            PathBuf::from(home)
                .join(".local/state")
                .join("sift")
                .join("requests.jsonl")
        })
    }

    /// Append to the request log. Write failures are reported at debug
    /// level only; the answer has already been shown.
    pub fn write(&self) {
        let Some(path) = Self::discover_log_path(|key| std::env::var(key).ok()) else {
            return;
        };

        if let Err(e) = self.write_to(&path) {
            tracing::debug!("Request log unavailable at {}: {}", path.display(), e);
        }
    }

    /// Append one JSON line to `path`
    pub fn write_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Generate request ID
    pub fn generate_req_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Current timestamp in ISO 8601 format
    pub fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_common::{Intent, LlmError};
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_log_path_priority() {
        let path = RequestLogEntry::discover_log_path(lookup_from(&[
            ("SIFT_LOG_FILE", "/tmp/custom.jsonl"),
            ("XDG_STATE_HOME", "/state"),
            ("HOME", "/home/u"),
        ]));
        assert_eq!(path, Some(PathBuf::from("/tmp/custom.jsonl")));

        let path = RequestLogEntry::discover_log_path(lookup_from(&[
            ("XDG_STATE_HOME", "/state"),
            ("HOME", "/home/u"),
        ]));
        assert_eq!(path, Some(PathBuf::from("/state/sift/requests.jsonl")));

        let path = RequestLogEntry::discover_log_path(lookup_from(&[("HOME", "/home/u")]));
        assert_eq!(
            path,
            Some(PathBuf::from("/home/u/.local/state/sift/requests.jsonl"))
        );

        assert_eq!(RequestLogEntry::discover_log_path(lookup_from(&[])), None);
    }

    #[test]
    fn test_entry_from_answer() {
        let result = Ok(Answer {
            path: Intent::Structured,
            text: "3 orders".to_string(),
        });
        let entry = RequestLogEntry::from_result("req-1", "How many?", &result, 42);

        assert!(entry.ok);
        assert_eq!(entry.path.as_deref(), Some("SQL"));
        assert!(entry.error.is_none());

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""path":"SQL""#));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_entry_from_error() {
        let result = Err(SiftError::Llm(LlmError::Timeout(60)));
        let entry = RequestLogEntry::from_result("req-2", "How many?", &result, 60_000);

        assert!(!entry.ok);
        assert!(entry.path.is_none());
        let error = entry.error.unwrap();
        assert_eq!(error.kind, "llm");
        assert!(error.message.contains("timeout"));
    }

    #[test]
    fn test_write_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("requests.jsonl");

        let result = Ok(Answer {
            path: Intent::Unsupported,
            text: "no".to_string(),
        });
        let entry = RequestLogEntry::from_result("req-3", "hi", &result, 1);
        entry.write_to(&path).unwrap();
        entry.write_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        let parsed: RequestLogEntry = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.req_id, "req-3");
        assert_eq!(parsed.path.as_deref(), Some("NONE"));
    }
}
