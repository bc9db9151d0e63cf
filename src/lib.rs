//! Styledash - compile pipeline for GitHub-hosted component libraries
//!
//! Clones a repository, discovers its UI components through static analysis,
//! compiles each component into a standalone loadable bundle in an isolated
//! child process, and reconciles the results against the persisted catalog.

pub mod compiler;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod git;
pub mod manifest;
pub mod orchestrator;
pub mod pool;
pub mod process;
pub mod queue;
pub mod reconciler;
pub mod store;
pub mod utils;
pub mod worker;

pub type Result<T> = anyhow::Result<T>;

// Re-export commonly used types
pub use compiler::{CompileOptions, CompiledComponent};
pub use config::{Config, Repository};
pub use error::PipelineError;
pub use orchestrator::{CompiledRepo, compile_repository};
pub use reconciler::{ReconcileOptions, ReconcileSummary, reconcile};
