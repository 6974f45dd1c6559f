//! External command runner.
//!
//! The distributed object store is reachable only through its command-line
//! clients, so every storage operation bottoms out in "spawn a child, read
//! its stdout". This module packages that as an injectable capability with
//! two guarantees the naive version lacks:
//!
//! - an enforced wall-clock timeout, so a hung client fails the request
//!   instead of wedging a worker forever;
//! - a bounded-but-growable stdout buffer, so output larger than the cap is
//!   an error rather than a silent truncation.
//!
//! The child is always reaped; on timeout it is killed first.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Cap on captured stderr, which is only used for diagnostics.
const MAX_STDERR_BYTES: u64 = 8 * 1024;

/// Captured result of one child process run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, or None if the child was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Whether the child exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stderr as trimmed text for diagnostics.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Capability to run an external command and capture its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, capturing stdout and stderr.
    ///
    /// Returns the captured output regardless of the child's exit status;
    /// interpreting a non-zero status is the caller's concern. Errors cover
    /// spawn failure, I/O failure, timeout, and oversized output.
    async fn run(&self, program: &str, args: &[&str]) -> StorageResult<CommandOutput>;
}

/// Production runner spawning real child processes.
pub struct ProcessRunner {
    timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessRunner {
    /// Create a runner with the given timeout and stdout cap.
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[&str]) -> StorageResult<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StorageError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
            StorageError::Io(std::io::Error::other("child stdout was not captured"))
        })?;
        let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
            StorageError::Io(std::io::Error::other("child stderr was not captured"))
        })?;

        let max_output = self.max_output_bytes;
        let run = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            // Read one byte past the cap so overflow is detectable. Both
            // pipes are drained concurrently to avoid a deadlock when the
            // child fills one while we block on the other.
            let mut stdout_reader = (&mut stdout_pipe).take(max_output as u64 + 1);
            let mut stderr_reader = (&mut stderr_pipe).take(MAX_STDERR_BYTES);
            tokio::try_join!(
                stdout_reader.read_to_end(&mut stdout),
                stderr_reader.read_to_end(&mut stderr)
            )?;

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((stdout, stderr, status))
        };

        // Bind the result first so the read future (and its borrows of the
        // child) is dropped before the match arms run.
        let result = tokio::time::timeout(self.timeout, run).await;

        let (stdout, stderr, status) = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(StorageError::Io(e)),
            Err(_) => {
                let _ = child.start_kill();
                return Err(StorageError::Timeout {
                    program: program.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        if stdout.len() > max_output {
            return Err(StorageError::OutputTooLarge {
                program: program.to_string(),
                limit: max_output,
            });
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ProcessRunner {
        ProcessRunner::new(Duration::from_secs(5), 64 * 1024)
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let output = runner().run("/bin/echo", &["hello"]).await.unwrap();
        assert_eq!(output.stdout, b"hello\n");
        assert!(output.success());
    }

    #[tokio::test]
    async fn reports_nonzero_exit() {
        let output = runner()
            .run("/bin/sh", &["-c", "echo oops >&2; exit 3"])
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stderr_text(), "oops");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let err = runner()
            .run("/nonexistent/depot-test-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Spawn { .. }));
    }

    #[tokio::test]
    async fn hung_child_times_out() {
        let runner = ProcessRunner::new(Duration::from_millis(200), 64 * 1024);
        let err = runner
            .run("/bin/sh", &["-c", "sleep 30"])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Timeout { .. }));
    }

    #[tokio::test]
    async fn oversized_output_is_an_error() {
        let runner = ProcessRunner::new(Duration::from_secs(5), 1024);
        let err = runner
            .run("/bin/sh", &["-c", "head -c 4096 /dev/zero"])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::OutputTooLarge { limit: 1024, .. }));
    }

    #[tokio::test]
    async fn output_at_cap_is_accepted() {
        let runner = ProcessRunner::new(Duration::from_secs(5), 1024);
        let output = runner
            .run("/bin/sh", &["-c", "head -c 1024 /dev/zero"])
            .await
            .unwrap();
        assert_eq!(output.stdout.len(), 1024);
    }
}
