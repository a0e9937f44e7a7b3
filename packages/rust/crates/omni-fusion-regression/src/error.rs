//! Error types for fusion regression runs.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, running, or verifying a fusion regression.
#[derive(Debug, Error)]
pub enum RegressionError {
    /// The regression configuration file does not exist.
    #[error("Regression configuration not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The regression configuration file could not be read.
    #[error("Failed to read regression configuration {}: {source}", path.display())]
    ConfigRead {
        /// Configuration path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The regression configuration is not valid YAML for the expected shape.
    #[error("Failed to parse regression configuration {}: {source}", path.display())]
    ConfigParse {
        /// Configuration path.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The configuration parsed but violates a structural rule.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One or more input run files are absent on disk.
    #[error("Missing run files: {}", format_paths(.0))]
    MissingRunFiles(Vec<PathBuf>),

    /// A subprocess could not be spawned.
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A subprocess exited with a failure status.
    #[error("Command `{command}` failed (exit {code:?}): {stderr}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The evaluator produced no non-empty output line.
    #[error("Command `{0}` produced no output")]
    EmptyOutput(String),

    /// The evaluator output line did not yield a numeric score.
    #[error("Cannot parse score from {line:?}: {reason}")]
    ParseScore {
        /// Result line that was parsed.
        line: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The JSON verdict report could not be written.
    #[error("Failed to write report {}: {reason}", path.display())]
    ReportWrite {
        /// Report path.
        path: PathBuf,
        /// Why writing failed.
        reason: String,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for regression operations.
pub type Result<T> = std::result::Result<T, RegressionError>;
