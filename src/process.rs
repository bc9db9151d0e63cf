//! Child process execution with captured output
//!
//! Every external tool the pipeline touches - git, the package manager, the
//! bundler child - runs through here so capture, exit-code, and deadline
//! handling stay in one place.

use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of a finished child process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    /// Captured stdout, `None` when the process wrote nothing at all
    pub stdout: Option<String>,
    /// Captured stderr, `None` when the process wrote nothing at all
    pub stderr: Option<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stderr text for error messages, with absent output spelled out
    pub fn stderr_text(&self) -> &str {
        self.stderr.as_deref().unwrap_or("(no output)")
    }
}

/// Run a command to completion, capturing stdout and stderr.
///
/// A spawn failure (missing executable) is an error; a non-zero exit is not -
/// the caller decides what a bad exit code means. When `stdin` is provided it
/// is written in full and the stream closed. When `deadline` is set, a child
/// still running at expiry is killed and the call fails with
/// [`PipelineError::ProcessTimeout`].
///
/// Output buffers are not capped; bundler children routinely print large
/// bundles on stdout.
pub async fn run_process(
    program: &str,
    args: &[&str],
    cwd: &Path,
    stdin: Option<&str>,
    deadline: Option<Duration>,
) -> Result<ProcessOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn '{program}'"))?;

    if let Some(input) = stdin
        && let Some(mut handle) = child.stdin.take()
    {
        handle
            .write_all(input.as_bytes())
            .await
            .with_context(|| format!("Failed to write stdin of '{program}'"))?;
        // Dropping the handle closes the stream
    }

    let wait = child.wait_with_output();
    let output = match deadline {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(output) => output,
            // The timed-out future is dropped here, which kills the child
            Err(_) => {
                return Err(PipelineError::ProcessTimeout {
                    program: program.to_string(),
                    timeout: limit,
                }
                .into());
            }
        },
        None => wait.await,
    }
    .with_context(|| format!("Failed to wait for '{program}'"))?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = (!output.stdout.is_empty())
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned());
    let stderr = (!output.stderr.is_empty())
        .then(|| String::from_utf8_lossy(&output.stderr).into_owned());

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_process_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let output = run_process("sh", &["-c", "echo hello"], dir.path(), None, None)
            .await
            .unwrap();
        assert_eq!(output.exit_code, 0);
        assert!(output.success());
        assert_eq!(output.stdout.as_deref(), Some("hello\n"));
        assert_eq!(output.stderr, None);
    }

    #[tokio::test]
    async fn test_run_process_captures_stderr() {
        let dir = TempDir::new().unwrap();
        let output = run_process("sh", &["-c", "echo oops >&2"], dir.path(), None, None)
            .await
            .unwrap();
        assert_eq!(output.stdout, None);
        assert_eq!(output.stderr.as_deref(), Some("oops\n"));
    }

    #[tokio::test]
    async fn test_run_process_no_output_is_none() {
        let dir = TempDir::new().unwrap();
        let output = run_process("true", &[], dir.path(), None, None).await.unwrap();
        assert_eq!(output.stdout, None);
        assert_eq!(output.stderr, None);
        assert_eq!(output.stderr_text(), "(no output)");
    }

    #[tokio::test]
    async fn test_run_process_exit_code() {
        let dir = TempDir::new().unwrap();
        let output = run_process("sh", &["-c", "exit 7"], dir.path(), None, None)
            .await
            .unwrap();
        assert_eq!(output.exit_code, 7);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_run_process_stdin_round_trip() {
        let dir = TempDir::new().unwrap();
        let output = run_process("cat", &[], dir.path(), Some("piped input"), None)
            .await
            .unwrap();
        assert_eq!(output.stdout.as_deref(), Some("piped input"));
    }

    #[tokio::test]
    async fn test_run_process_working_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let output = run_process("ls", &["marker.txt"], dir.path(), None, None)
            .await
            .unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_run_process_spawn_failure_is_error_not_exit_code() {
        let dir = TempDir::new().unwrap();
        let result = run_process("nonexistent_command_12345", &[], dir.path(), None, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_process_deadline_kills_child() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();
        let result = run_process(
            "sleep",
            &["30"],
            dir.path(),
            None,
            Some(Duration::from_millis(200)),
        )
        .await;
        assert!(started.elapsed() < Duration::from_secs(5));
        let err = result.unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::ProcessTimeout { program, .. }) => assert_eq!(program, "sleep"),
            other => panic!("expected ProcessTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_process_deadline_not_hit() {
        let dir = TempDir::new().unwrap();
        let output = run_process(
            "sh",
            &["-c", "echo quick"],
            dir.path(),
            None,
            Some(Duration::from_secs(30)),
        )
        .await
        .unwrap();
        assert_eq!(output.stdout.as_deref(), Some("quick\n"));
    }
}
