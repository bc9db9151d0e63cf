//! Shallow cloning into disposable temporary directories
//!
//! Every compilation gets an exclusive clone in a fresh temporary directory.
//! The [`CloneHandle`] pairs the clone root with its cleanup: explicit
//! `cleanup()` on the normal path, `Drop` of the owned temp dir as the
//! backstop, so no exit path leaks the tree.

use crate::constants;
use crate::error::PipelineError;
use crate::process::run_process;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A completed clone and the temporary directory that owns it
#[derive(Debug)]
pub struct CloneHandle {
    root: PathBuf,
    temp_dir: Option<TempDir>,
}

impl CloneHandle {
    /// Root of the cloned working tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recursively remove the temporary directory tree.
    ///
    /// Safe to call more than once; later calls are no-ops. Dropping the
    /// handle without calling this removes the tree as well.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.temp_dir.take()
            && let Err(err) = dir.close()
        {
            eprintln!("Failed to remove clone directory: {err}");
        }
    }
}

/// Shallow-clone `clone_url` into a fresh, uniquely named temporary
/// directory.
///
/// The URL may embed an access token; it is never logged, and any token is
/// redacted from the error text of a failed clone. On a non-zero exit the
/// temporary directory is removed before the error is returned.
pub async fn clone_repository(clone_url: &str) -> Result<CloneHandle> {
    let temp_dir = TempDir::new().context("Failed to create temporary clone directory")?;
    let root = temp_dir.path().join(constants::git::CLONE_DIR);

    let output = run_process(
        "git",
        &[
            "clone",
            "--depth",
            constants::git::CLONE_DEPTH,
            clone_url,
            constants::git::CLONE_DIR,
        ],
        temp_dir.path(),
        None,
        None,
    )
    .await?;

    if !output.success() {
        // temp_dir drops here, removing the partial clone before the caller
        // sees the error
        return Err(PipelineError::CloneFailed {
            exit_code: output.exit_code,
            stderr: redact_token(output.stderr_text(), clone_url),
        }
        .into());
    }

    Ok(CloneHandle {
        root,
        temp_dir: Some(temp_dir),
    })
}

/// Replace any access token embedded in `clone_url` with `***` wherever it
/// appears in `text`. Git echoes the full remote URL in its error output.
fn redact_token(text: &str, clone_url: &str) -> String {
    if let Some(scheme_end) = clone_url.find("://")
        && let Some(at) = clone_url[scheme_end + 3..].find('@')
    {
        let token = &clone_url[scheme_end + 3..scheme_end + 3 + at];
        if !token.is_empty() {
            return text.replace(token, "***");
        }
    }
    text.to_string()
}
