//! Fusion backend adapters.
//!
//! Both backends implement the same fusion methods but speak different flag
//! vocabularies. Each adapter turns a [`FusionMethodSpec`] into the
//! [`InvocationSpec`] its tool understands.

use std::fmt;
use std::path::Path;

use crate::command::InvocationSpec;
use crate::config::{FusionMethodKind, FusionMethodSpec};
use crate::settings::HarnessSettings;

/// A fusion tool that can be driven from a method specification.
pub trait FusionBackend: Send + Sync {
    /// Backend name, as used in run tags and logs.
    fn name(&self) -> &str;

    /// Build the command fusing `runs` with `method`.
    fn build(&self, method: &FusionMethodSpec, runs: &[&Path]) -> InvocationSpec;
}

/// Which fusion backend a regression run exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// The native Java fusion tool.
    #[default]
    Anserini,
    /// The Python fusion module.
    Pyserini,
}

impl BackendKind {
    /// Backend name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Anserini => "anserini",
            Self::Pyserini => "pyserini",
        }
    }

    /// Adapter for this backend, using the executables from `settings`.
    #[must_use]
    pub fn adapter(self, settings: &HarnessSettings) -> Box<dyn FusionBackend> {
        match self {
            Self::Anserini => Box::new(AnseriniBackend::new(&settings.anserini_command)),
            Self::Pyserini => Box::new(PyseriniBackend::new(&settings.pyserini_command)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Native fusion tool: every parameter is always passed.
#[derive(Debug, Clone)]
pub struct AnseriniBackend {
    command: String,
}

impl AnseriniBackend {
    /// Create an adapter invoking `command` (e.g. `bin/run.sh io.anserini.fusion.FuseRuns`).
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl FusionBackend for AnseriniBackend {
    fn name(&self) -> &'static str {
        BackendKind::Anserini.name()
    }

    fn build(&self, method: &FusionMethodSpec, runs: &[&Path]) -> InvocationSpec {
        // -runs takes one space-joined token; the shell splits it back.
        let joined_runs = runs
            .iter()
            .map(|run| run.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let mut tokens = command_tokens(&self.command);
        tokens.extend([
            "-runs".to_string(),
            joined_runs,
            "-output".to_string(),
            method.output.display().to_string(),
            "-method".to_string(),
            method.name.to_string(),
            "-k".to_string(),
            method.k.to_string(),
            "-depth".to_string(),
            method.depth.to_string(),
            "-rrf_k".to_string(),
            method.rrf_k.to_string(),
            "-alpha".to_string(),
            format_float(method.alpha),
        ]);
        InvocationSpec::new(tokens)
    }
}

/// Python fusion module: only the parameters of the selected method.
#[derive(Debug, Clone)]
pub struct PyseriniBackend {
    command: String,
}

impl PyseriniBackend {
    /// Create an adapter invoking `command` (e.g. `python -m pyserini.fusion`).
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl FusionBackend for PyseriniBackend {
    fn name(&self) -> &'static str {
        BackendKind::Pyserini.name()
    }

    fn build(&self, method: &FusionMethodSpec, runs: &[&Path]) -> InvocationSpec {
        let mut tokens = command_tokens(&self.command);
        tokens.extend(["--method".to_string(), method.name.to_string()]);
        tokens.push("--runs".to_string());
        tokens.extend(runs.iter().map(|run| run.display().to_string()));
        tokens.extend([
            "--output".to_string(),
            method.output.display().to_string(),
            "--runtag".to_string(),
            format!("{}.{}", self.name(), method.name),
            "--k".to_string(),
            method.k.to_string(),
            "--depth".to_string(),
            method.depth.to_string(),
        ]);
        match method.name {
            FusionMethodKind::Rrf => {
                tokens.extend(["--rrf.k".to_string(), method.rrf_k.to_string()]);
            }
            FusionMethodKind::Interpolation => {
                tokens.extend(["--alpha".to_string(), format_float(method.alpha)]);
            }
            FusionMethodKind::Average | FusionMethodKind::Normalize => {}
        }
        InvocationSpec::new(tokens)
    }
}

fn command_tokens(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Shortest round-trip rendering that keeps a decimal point (`0.5`, `1.0`).
fn format_float(value: f64) -> String {
    format!("{value:?}")
}
