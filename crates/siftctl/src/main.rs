//! Sift Control - ask questions of a database and a document set
//!
//! Each question is routed to SQL generation, document retrieval, or a
//! polite refusal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sift_common::SiftConfig;
use siftctl::{commands, logging, repl};
use std::path::PathBuf;
use std::process::ExitCode;

// Version is embedded at build time
const VERSION: &str = env!("SIFT_VERSION");

#[derive(Parser)]
#[command(name = "siftctl")]
#[command(about = "Sift - answers questions from your database and documents", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Config file (default: ~/.config/sift/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question (quoting optional)
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Interactive session (default)
    Repl,

    /// Check a SQL statement against the guardrail without running it
    CheckSql {
        statement: String,
    },

    /// Create a demo database with products and orders
    InitDemo {
        /// Database file (default: configured database path)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Show effective configuration
    Config {
        /// Write default configuration to the user config path
        #[arg(long)]
        init: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            siftctl::output::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = SiftConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Ask { question } => {
            if !commands::ask(&config, &question.join(" "))? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Repl => repl::start_repl(&config, VERSION)?,
        Commands::CheckSql { statement } => {
            if !commands::check_sql(&statement) {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::InitDemo { path } => commands::init_demo(&config, path)?,
        Commands::Config { init } => commands::config(&config, init)?,
    }

    Ok(ExitCode::SUCCESS)
}
