//! Running the external converter.
//!
//! The engine never spawns processes itself; it hands a [`CommandLine`] to a
//! [`CommandRunner`]. [`ProcessRunner`] is the real implementation,
//! [`DryRunRunner`] only logs what would run.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::job::CommandLine;
use crate::{Error, Result};

/// Output captured from a tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Process exit status, absent when nothing was launched.
    pub status: Option<ExitStatus>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// Capability to run one external command to completion.
///
/// Implementations return `Err(Error::Tool { .. })` for launch failures,
/// timeouts and non-zero exits; the engine turns that into a failed result.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<ToolOutput>;
}

/// Runs commands as child processes, optionally bounded by a timeout.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill and fail any invocation running longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<ToolOutput> {
        let tool = command.program_name();
        debug!(command = %command, "Spawning converter");

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool(&tool, format!("failed to spawn: {e}")))?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                // Dropping the future drops the child, and kill_on_drop reaps it.
                Err(_elapsed) => {
                    return Err(Error::tool(&tool, format!("timed out after {:?}", limit)));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| Error::tool(&tool, format!("I/O error waiting for process: {e}")))?;

        let tool_output = ToolOutput {
            status: Some(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            let detail = match tool_output.stderr.trim() {
                "" => tool_output.stdout.trim(),
                stderr => stderr,
            };
            return Err(Error::tool(
                tool,
                format!("exited with status {}: {}", output.status, detail),
            ));
        }

        Ok(tool_output)
    }
}

/// Logs the command instead of running it and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, command: &CommandLine) -> Result<ToolOutput> {
        info!("[DRY RUN] Would execute: {}", command);
        Ok(ToolOutput::default())
    }
}
