//! External tool invocation with timeouts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// A single invocation of an external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Human-readable name used in logs and errors.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Working directory, inherited when `None`.
    pub cwd: Option<PathBuf>,

    /// Extra environment variables.
    pub env: Vec<(String, String)>,

    /// Timeout in seconds, 0 disables it.
    pub timeout_secs: u64,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            command,
            cwd: None,
            env: Vec::new(),
            timeout_secs,
        }
    }

    pub fn in_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Captured result of a finished invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub name: String,

    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,

    pub stdout: Vec<u8>,

    pub stderr: String,

    pub duration_ms: u64,

    pub success: bool,
}

impl ToolOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Short failure description: last stderr line, or the exit code.
    pub fn failure_detail(&self) -> String {
        match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("exit code {}: {}", self.exit_code, line.trim()),
            None => format!("exit code {}", self.exit_code),
        }
    }
}

/// Failures to run a tool at all.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool {0} has empty command")]
    EmptyCommand(String),

    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} timed out after {secs} seconds")]
    TimedOut { name: String, secs: u64 },
}

/// Runs tool invocations to completion.
pub struct ToolRunner;

impl ToolRunner {
    /// Execute a single invocation and capture its output.
    ///
    /// A non-zero exit is reported through `ToolOutput::success`, not as an
    /// error; errors mean the tool never produced an exit status.
    pub async fn execute(invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();

        let (exe, args) = invocation
            .command
            .split_first()
            .ok_or_else(|| ToolError::EmptyCommand(invocation.name.clone()))?;

        debug!(tool = %invocation.name, command = ?invocation.command, "Spawning tool");

        let mut command = Command::new(exe);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| ToolError::Spawn {
            name: invocation.name.clone(),
            source,
        })?;

        let wait = child.wait_with_output();
        let output = if invocation.timeout_secs > 0 {
            tokio::time::timeout(Duration::from_secs(invocation.timeout_secs), wait)
                .await
                .map_err(|_| ToolError::TimedOut {
                    name: invocation.name.clone(),
                    secs: invocation.timeout_secs,
                })?
        } else {
            wait.await
        }
        .map_err(|source| ToolError::Spawn {
            name: invocation.name.clone(),
            source,
        })?;

        Ok(ToolOutput {
            name: invocation.name.clone(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            success: output.status.success(),
        })
    }
}
