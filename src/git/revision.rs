//! Commit resolution for cloned working trees

use crate::error::PipelineError;
use crate::process::run_process;
use anyhow::Result;
use std::path::Path;

/// Resolve the HEAD commit hash of the repository at `repo_path`.
///
/// A non-zero exit or empty output is fatal: without a commit hash the
/// compilation cannot be attributed to a revision.
pub async fn resolve_head_commit(repo_path: &Path) -> Result<String> {
    let output = run_process("git", &["rev-parse", "HEAD"], repo_path, None, None).await?;

    if !output.success() {
        return Err(PipelineError::RevisionFailed(output.stderr_text().to_string()).into());
    }

    let hash = output.stdout.as_deref().unwrap_or("").trim().to_string();
    if hash.is_empty() {
        return Err(
            PipelineError::RevisionFailed("rev-parse produced no output".to_string()).into(),
        );
    }

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn create_repo_with_commit() -> TempDir {
        let dir = TempDir::new().unwrap();
        let path = dir.path();
        Command::new("git").args(["init"]).current_dir(path).output().unwrap();
        Command::new("git")
            .args(["config", "user.name", "Test User"])
            .current_dir(path)
            .output()
            .unwrap();
        Command::new("git")
            .args(["config", "user.email", "test@example.com"])
            .current_dir(path)
            .output()
            .unwrap();
        fs::write(path.join("file.txt"), "content").unwrap();
        Command::new("git").args(["add", "."]).current_dir(path).output().unwrap();
        Command::new("git")
            .args(["commit", "-m", "Initial commit"])
            .current_dir(path)
            .output()
            .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_resolve_head_commit() {
        let repo = create_repo_with_commit();
        let hash = resolve_head_commit(repo.path()).await.unwrap();
        assert_eq!(hash.len(), 40);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_resolve_head_commit_outside_repository() {
        let dir = TempDir::new().unwrap();
        let result = resolve_head_commit(dir.path()).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::RevisionFailed(_))
        ));
    }
}
