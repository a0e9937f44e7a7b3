//! Subprocess execution for fusion and evaluation commands.
//!
//! Command lines are handed to a shell (`sh -c`), so multi-word executables
//! and space-joined arguments expand the same way they would when typed.
//! Runs are synchronous: each command finishes before the next starts.

use std::process::{Command, Stdio};

use crate::command::InvocationSpec;
use crate::error::{RegressionError, Result};

/// Whether commands are spawned or only rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Spawn every command.
    #[default]
    Execute,
    /// Log rendered command lines without spawning anything.
    DryRun,
}

/// Result of running one fusion command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Exited with status 0.
    Completed,
    /// Exited with a failure status.
    Failed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The process could not be spawned.
    SpawnError(String),
    /// Dry run: nothing was spawned.
    Skipped,
}

impl ExecutionOutcome {
    /// Whether the command ran and succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Runs [`InvocationSpec`]s through a shell.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: String,
    mode: ExecutionMode,
}

impl CommandExecutor {
    /// Create an executor using `shell -c <command line>`.
    #[must_use]
    pub fn new(shell: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            shell: shell.into(),
            mode,
        }
    }

    /// Execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Whether this executor only renders commands.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.mode == ExecutionMode::DryRun
    }

    /// Run one command, logging failures instead of returning them.
    ///
    /// Standard output streams through; standard error is captured and logged
    /// at debug level on success, or at error level on failure.
    pub fn run(&self, spec: &InvocationSpec) -> ExecutionOutcome {
        let command_line = spec.command_line();
        if self.is_dry_run() {
            tracing::info!(command = %command_line, "dry run");
            return ExecutionOutcome::Skipped;
        }

        tracing::info!(command = %command_line, "running command");
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
                    tracing::debug!(command = %command_line, "{line}");
                }
                ExecutionOutcome::Completed
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                tracing::error!(
                    code = ?output.status.code(),
                    command = %command_line,
                    stderr = %stderr,
                    "command failed"
                );
                ExecutionOutcome::Failed {
                    code: output.status.code(),
                    stderr,
                }
            }
            Err(error) => {
                tracing::error!(command = %command_line, error = %error, "failed to spawn command");
                ExecutionOutcome::SpawnError(error.to_string())
            }
        }
    }

    /// Run every command in order; a failure never stops the batch.
    pub fn run_all(&self, specs: &[InvocationSpec]) -> Vec<ExecutionOutcome> {
        specs.iter().map(|spec| self.run(spec)).collect()
    }

    /// Run a command and return its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::Spawn`] when the shell cannot start and
    /// [`RegressionError::CommandFailed`] on a non-zero exit.
    pub fn capture(&self, spec: &InvocationSpec) -> Result<String> {
        let command_line = spec.command_line();
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RegressionError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RegressionError::CommandFailed {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
