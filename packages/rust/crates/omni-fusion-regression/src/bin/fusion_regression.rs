//! fusion-regression CLI: run one fusion regression end to end.
//!
//! Loads `<config-dir>/<regression>.yaml`, fuses the listed runs with the
//! selected backend, scores every fused run, and logs one verdict per
//! (method, topic set, metric).
//!
//! Logging: set `RUST_LOG=omni_fusion_regression=debug` for more detail.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use omni_fusion_regression::{
    BackendKind, CommandExecutor, Evaluator, ExecutionMode, ExecutionOutcome, HarnessSettings,
    RegressionConfig, RegressionError, build_fusion_commands,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Anserini,
    Pyserini,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Anserini => Self::Anserini,
            BackendArg::Pyserini => Self::Pyserini,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fusion-regression")]
#[command(about = "Run fusion regression tests against recorded effectiveness scores.")]
struct Cli {
    /// Name of the regression test configuration (or a path to a YAML file).
    #[arg(long)]
    regression: String,

    /// Output commands without actual execution.
    #[arg(long)]
    dry_run: bool,

    /// Fusion implementation to exercise.
    #[arg(long, value_enum, default_value_t = BackendArg::Anserini)]
    backend: BackendArg,

    /// Shorthand for `--backend pyserini`.
    #[arg(long, conflicts_with = "backend")]
    use_pyserini: bool,

    /// Directory holding regression YAML files.
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Directory qrels paths are relative to.
    #[arg(long, value_name = "DIR")]
    qrels_root: Option<PathBuf>,

    /// Shell used to run commands.
    #[arg(long)]
    shell: Option<String>,

    /// Command prefix of the Anserini fusion tool.
    #[arg(long)]
    anserini_command: Option<String>,

    /// Command prefix of the Pyserini fusion module.
    #[arg(long)]
    pyserini_command: Option<String>,

    /// Relative tolerance for score comparison (default: 1e-9).
    #[arg(long)]
    rel_tol: Option<f64>,

    /// Absolute tolerance for score comparison (default: 0).
    #[arg(long)]
    abs_tol: Option<f64>,

    /// Exit with status 1 when any metric fails verification.
    #[arg(long)]
    fail_on_mismatch: bool,

    /// Write all verdicts as JSON to this file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl Cli {
    fn settings(&self) -> HarnessSettings {
        let mut settings = HarnessSettings::default();
        if let Some(dir) = &self.config_dir {
            settings.config_dir.clone_from(dir);
        }
        if let Some(root) = &self.qrels_root {
            settings.qrels_root.clone_from(root);
        }
        if let Some(shell) = &self.shell {
            settings.shell.clone_from(shell);
        }
        if let Some(command) = &self.anserini_command {
            settings.anserini_command.clone_from(command);
        }
        if let Some(command) = &self.pyserini_command {
            settings.pyserini_command.clone_from(command);
        }
        if let Some(rel_tol) = self.rel_tol {
            settings.tolerance.rel_tol = rel_tol;
        }
        if let Some(abs_tol) = self.abs_tol {
            settings.tolerance.abs_tol = abs_tol;
        }
        settings.fail_on_mismatch = self.fail_on_mismatch;
        settings
    }

    fn backend_kind(&self) -> BackendKind {
        if self.use_pyserini {
            BackendKind::Pyserini
        } else {
            self.backend.into()
        }
    }

    fn mode(&self) -> ExecutionMode {
        if self.dry_run {
            ExecutionMode::DryRun
        } else {
            ExecutionMode::Execute
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("omni_fusion_regression=info,fusion_regression=info")
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let settings = cli.settings();
    let config_path = settings.config_path(&cli.regression);
    let config = RegressionConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration file {}", config_path.display()))?;

    if let Err(error) = config.preflight() {
        if let RegressionError::MissingRunFiles(paths) = &error {
            for path in paths {
                tracing::error!(
                    "Run file {} does not exist. Please run the dependent regressions first, recorded in the fusion yaml file.",
                    path.display()
                );
            }
        }
        return Err(error.into());
    }

    let started = Instant::now();
    let backend_kind = cli.backend_kind();
    tracing::info!(backend = %backend_kind, "Using {backend_kind} fusion implementation");

    let backend = backend_kind.adapter(&settings);
    let executor = CommandExecutor::new(settings.shell.as_str(), cli.mode());
    let commands = build_fusion_commands(&config, backend.as_ref());
    let failed = executor
        .run_all(&commands)
        .iter()
        .filter(|outcome| {
            matches!(
                outcome,
                ExecutionOutcome::Failed { .. } | ExecutionOutcome::SpawnError(_)
            )
        })
        .count();
    if failed > 0 {
        tracing::warn!(
            failed,
            "fusion commands failed; their outputs may be missing or stale"
        );
    }

    let report = Evaluator::new(&settings, &executor).evaluate(&config);
    report.log_summary(started);

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        tracing::info!(path = %path.display(), "wrote verdict report");
    }

    let code = report.exit_code(settings.fail_on_mismatch);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
