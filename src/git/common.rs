//! Common utilities shared across pipeline stages
//!
//! This module contains helpers used by every stage of the compile pipeline,
//! such as logging.

use colored::*;

/// Logger for pipeline operations with consistent formatting
///
/// Provides standardized logging methods so output from interleaved pool
/// tasks stays attributable. Each log message carries a local timestamp and
/// the repository name in cyan/bold for easy identification.
///
/// ## Example
///
/// ```rust,no_run
/// use styledash::git::Logger;
///
/// let logger = Logger;
/// logger.info("design-system", "Starting compilation");
/// logger.success("design-system", "Compiled 12 components");
/// ```
#[derive(Default)]
pub struct Logger;

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

impl Logger {
    pub fn info(&self, repo: &str, msg: &str) {
        println!("{} {} | {}", timestamp(), repo.cyan().bold(), msg);
    }

    pub fn success(&self, repo: &str, msg: &str) {
        println!("{} {} | {}", timestamp(), repo.cyan().bold(), msg.green());
    }

    pub fn warn(&self, repo: &str, msg: &str) {
        println!("{} {} | {}", timestamp(), repo.cyan().bold(), msg.yellow());
    }

    pub fn error(&self, repo: &str, msg: &str) {
        eprintln!("{} {} | {}", timestamp(), repo.cyan().bold(), msg.red());
    }
}
