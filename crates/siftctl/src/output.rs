//! Output formatting - plain ASCII terminal output

use owo_colors::OwoColorize;
use sift_common::{Answer, GuardrailVerdict, Intent};

/// Path line and answer text
pub fn display_answer(answer: &Answer) {
    let path = match answer.path {
        Intent::Structured => answer.path.path_label().cyan().to_string(),
        Intent::Unstructured => answer.path.path_label().green().to_string(),
        Intent::Unsupported => answer.path.path_label().yellow().to_string(),
    };

    println!("{}", format!("[Log]: Path selected -> {}", path).dimmed());
    println!("Response: {}", answer.text);
}

/// Display an error
pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

pub fn display_verdict(statement: &str, verdict: &GuardrailVerdict) {
    match verdict {
        GuardrailVerdict::Safe => println!("{} {}", "[SAFE]".bright_green(), statement),
        GuardrailVerdict::Rejected { keyword } => println!(
            "{} {} (forbidden keyword: {})",
            "[BLOCKED]".bright_red(),
            statement,
            keyword
        ),
    }
}

pub fn display_banner(version: &str) {
    println!("{}", format!("--- Sift v{} ---", version).bold());
    println!("Ask about orders and products, or about store policies. Type 'exit' to quit.");
}

pub fn display_prompt() {
    use std::io::Write;

    print!("\n{} ", "Your Question (or 'exit'):".bold());
    let _ = std::io::stdout().flush();
}
