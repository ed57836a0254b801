//! SQL guardrail: best-effort keyword denylist
//!
//! Rejects a generated statement when any of [`FORBIDDEN_KEYWORDS`] appears as
//! a whole word, in any casing, anywhere in the text. Identifiers that merely
//! contain a keyword (`update_time`, `updated_at`, `dropped`) pass.
//!
//! # Limitations
//!
//! This is a denylist over keywords, not a parser. It does not strip comments,
//! split multiple statements, or understand dialect-specific syntax, so it
//! cannot catch obfuscated or alternate-syntax mutations (encoded keywords,
//! `REPLACE INTO`, `PRAGMA` writes, `ATTACH`, ...). Callers must not treat a
//! passing verdict as proof that a statement is read-only.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Mutation keywords that block execution
pub const FORBIDDEN_KEYWORDS: [&str; 6] = ["DELETE", "DROP", "UPDATE", "INSERT", "ALTER", "TRUNCATE"];

static FORBIDDEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn forbidden_pattern() -> &'static Regex {
    FORBIDDEN_PATTERN.get_or_init(|| {
        let alternatives = FORBIDDEN_KEYWORDS.join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives)).unwrap()
    })
}

/// Outcome of a guardrail check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GuardrailVerdict {
    Safe,
    /// First forbidden keyword found, uppercased
    Rejected { keyword: String },
}

impl GuardrailVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, GuardrailVerdict::Safe)
    }
}

/// Check a statement and report the first forbidden keyword, if any
pub fn check(statement: &str) -> GuardrailVerdict {
    match forbidden_pattern().find(statement) {
        Some(m) => GuardrailVerdict::Rejected {
            keyword: m.as_str().to_uppercase(),
        },
        None => GuardrailVerdict::Safe,
    }
}

/// True only when no forbidden keyword matches
pub fn is_safe(statement: &str) -> bool {
    check(statement).is_safe()
}
