//! Sift Control - CLI front end for the Sift question router

pub mod commands;
pub mod logging;
pub mod output;
pub mod repl;
