//! omni-fusion-regression - Regression harness for rank-fusion backends.
//!
//! Drives an external fusion tool over pre-computed run files, scores the
//! fused runs with an external evaluator, and checks every
//! (method, topic set, metric) score against the recorded expectation.
//!
//! # Architecture (ODF-REP Compliant)
//!
//! ```text
//! omni-fusion-regression/src/
//! ├── lib.rs          # Re-exports (this file)
//! ├── error.rs        # RegressionError enum
//! ├── config.rs       # Regression YAML model, loading, validation
//! ├── settings.rs     # HarnessSettings (paths, executables, tolerance)
//! ├── backend.rs      # FusionBackend adapters (anserini / pyserini)
//! ├── command.rs      # InvocationSpec + fusion command builder
//! ├── executor.rs     # Subprocess execution and dry-run rendering
//! ├── tolerance.rs    # is_close, rounding, pass rule
//! ├── evaluation.rs   # Evaluation & comparison engine
//! └── report.rs       # Verdict records and summary
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_fusion_regression::{
//!     BackendKind, CommandExecutor, Evaluator, ExecutionMode, HarnessSettings,
//!     RegressionConfig, build_fusion_commands,
//! };
//!
//! let settings = HarnessSettings::default();
//! let config = RegressionConfig::load(&settings.config_path("beir-fusion"))?;
//! let executor = CommandExecutor::new(&settings.shell, ExecutionMode::Execute);
//! let commands = build_fusion_commands(&config, BackendKind::Anserini.adapter(&settings).as_ref());
//! executor.run_all(&commands);
//! let report = Evaluator::new(&settings, &executor).evaluate(&config);
//! ```

// ============================================================================
// Module Declarations (ODF-REP: Atomic Structure)
// ============================================================================

mod backend;
mod command;
mod config;
mod error;
mod evaluation;
mod executor;
mod report;
mod settings;
mod tolerance;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use backend::{AnseriniBackend, BackendKind, FusionBackend, PyseriniBackend};
pub use command::{InvocationSpec, SUPPORTED_FUSION_METHODS, build_fusion_commands};
pub use config::{
    ExpectedResults, ExpectedScores, FusionMethodKind, FusionMethodSpec, MetricSpec,
    RegressionConfig, RunFileRef, TopicSet,
};
pub use error::{RegressionError, Result};
pub use evaluation::{
    EvaluationOutcome, Evaluator, evaluation_command, last_result_line, parse_score,
};
pub use executor::{CommandExecutor, ExecutionMode, ExecutionOutcome};
pub use report::{RegressionReport, Verdict, VerdictRecord};
pub use settings::HarnessSettings;
pub use tolerance::{Tolerance, is_close, round_to};
