//! REPL - one question per line until `exit` or EOF
//!
//! Questions are handled strictly one at a time. A failed question is
//! reported and the loop moves on to the next one.

use crate::commands::{answer_question, build_controller};
use crate::output;
use anyhow::Result;
use sift_common::SiftConfig;
use std::io::{self, BufRead};

/// Words that end the session
const EXIT_WORDS: &[&str] = &["exit", "quit"];

pub fn is_exit(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    EXIT_WORDS.contains(&lower.as_str())
}

pub fn start_repl(config: &SiftConfig, version: &str) -> Result<()> {
    let controller = build_controller(config)?;
    output::display_banner(version);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        output::display_prompt();

        let input = match lines.next() {
            Some(Ok(line)) => line.trim().to_string(),
            Some(Err(e)) => {
                output::display_error(&format!("Error reading input: {}", e));
                continue;
            }
            None => break, // EOF
        };

        if input.is_empty() {
            continue;
        }
        if is_exit(&input) {
            break;
        }

        // Errors were already displayed and logged
        let _ = answer_question(&controller, &input);
    }

    Ok(())
}
