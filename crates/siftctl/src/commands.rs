//! Subcommand implementations

use crate::logging::RequestLogEntry;
use crate::output;
use anyhow::Result;
use sift_common::database::SqliteDatabase;
use sift_common::knowledge::{default_passages, load_passages, KeywordRetriever};
use sift_common::llm_client::HttpCompletionClient;
use sift_common::{guardrail, Answer, Collaborators, DispatchController, SiftConfig, SiftError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Create collaborator handles once and wire the controller
pub fn build_controller(config: &SiftConfig) -> Result<DispatchController> {
    let llm = Arc::new(HttpCompletionClient::new(config.llm.clone())?);
    let db = Arc::new(SqliteDatabase::open(&config.database.path)?);

    let passages = match &config.retrieval.corpus_path {
        Some(path) => load_passages(path)?,
        None => default_passages(),
    };
    let retriever = Arc::new(KeywordRetriever::new(passages, config.retrieval.top_k));

    info!(
        model = %config.llm.model,
        database = %config.database.path.display(),
        passages = retriever.len(),
        "Collaborators ready"
    );

    Ok(DispatchController::from_collaborators(Collaborators {
        llm,
        schema: db.clone(),
        executor: db,
        retriever,
    }))
}

/// Handle one question: answer, print, log
pub fn answer_question(
    controller: &DispatchController,
    question: &str,
) -> Result<Answer, SiftError> {
    let req_id = RequestLogEntry::generate_req_id();
    let started = Instant::now();

    let result = controller.handle(question);

    let duration_ms = started.elapsed().as_millis() as u64;
    RequestLogEntry::from_result(&req_id, question, &result, duration_ms).write();

    match &result {
        Ok(answer) => output::display_answer(answer),
        Err(e) => output::display_error(&e.to_string()),
    }
    result
}

/// Answer one question; false when it failed (already displayed and logged)
pub fn ask(config: &SiftConfig, question: &str) -> Result<bool> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("Question must not be empty");
    }

    let controller = build_controller(config)?;
    Ok(answer_question(&controller, question).is_ok())
}

/// Run a statement through the guardrail only; true when it passes
pub fn check_sql(statement: &str) -> bool {
    let verdict = guardrail::check(statement);
    output::display_verdict(statement, &verdict);
    verdict.is_safe()
}

pub fn init_demo(config: &SiftConfig, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| config.database.path.clone());
    let db = SqliteDatabase::open(&path)?;
    db.seed_demo()?;
    println!("Demo database ready at {}", path.display());
    Ok(())
}

pub fn config(config: &SiftConfig, init: bool) -> Result<()> {
    if init {
        let path = SiftConfig::user_config_path()?;
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        SiftConfig::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let rendered = toml_string(config)?;
    print!("{}", rendered);
    Ok(())
}

fn toml_string(config: &SiftConfig) -> Result<String> {
    // api_key never reaches the terminal
    let mut shown = config.clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some("********".to_string());
    }
    shown.to_toml_string()
}
