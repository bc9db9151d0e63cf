//! Fatal pipeline errors
//!
//! Only failures that abort an entire repository compilation live here.
//! Per-component failures (doc extraction, a single build, a single
//! reconciliation write) are absorbed where they happen and never reach this
//! taxonomy.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// `git clone` exited non-zero; the temporary directory is already gone
    #[error("git clone failed with exit code {exit_code}: {stderr}")]
    CloneFailed { exit_code: i32, stderr: String },

    /// No package manifest at the repository root
    #[error("no package manifest found at {0}")]
    ManifestMissing(PathBuf),

    /// The manifest exists but could not be parsed
    #[error("package manifest at {path} is malformed: {reason}")]
    ManifestMalformed { path: PathBuf, reason: String },

    /// Dependency installation exited non-zero
    #[error("dependency install failed with exit code {exit_code}: {stderr}")]
    InstallFailed { exit_code: i32, stderr: String },

    /// The HEAD commit hash could not be resolved
    #[error("failed to resolve HEAD commit: {0}")]
    RevisionFailed(String),

    /// A child process exceeded its deadline and was killed
    #[error("'{program}' timed out after {timeout:?}")]
    ProcessTimeout { program: String, timeout: Duration },
}
