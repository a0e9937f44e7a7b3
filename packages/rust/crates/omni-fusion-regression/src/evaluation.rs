//! Evaluation & comparison engine.
//!
//! Scores every fused run with the external evaluator and compares the
//! measured metric against the expectation recorded in the regression file.
//! Triples are visited method-major, topic-minor, metric-innermost. A triple
//! that cannot be evaluated is skipped and logged; it never stops the run.

use std::path::Path;

use crate::command::InvocationSpec;
use crate::config::{FusionMethodSpec, MetricSpec, RegressionConfig, TopicSet};
use crate::error::{RegressionError, Result};
use crate::executor::CommandExecutor;
use crate::report::{RegressionReport, VerdictRecord};
use crate::settings::HarnessSettings;
use crate::tolerance::round_to;

/// Result of evaluating one (method, topic set, metric) triple.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// The score was measured and judged.
    Judged(VerdictRecord),
    /// The evaluator failed or its output was unusable.
    Skipped(String),
    /// Dry run: the command was only rendered.
    DryRun,
}

/// Evaluator command: `<command> [params] <qrels> <run>`.
#[must_use]
pub fn evaluation_command(metric: &MetricSpec, qrels: &Path, run: &Path) -> InvocationSpec {
    let mut tokens = vec![metric.command.clone()];
    if let Some(params) = metric.params.as_deref() {
        tokens.extend(params.split_whitespace().map(str::to_string));
    }
    tokens.push(qrels.display().to_string());
    tokens.push(run.display().to_string());
    InvocationSpec::new(tokens)
}

/// Last non-blank line of evaluator output, trimmed.
#[must_use]
pub fn last_result_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).rfind(|line| !line.is_empty())
}

/// Extract the score at `parse_index` of `line` split by `separator`.
///
/// A negative index counts from the last field.
///
/// # Errors
///
/// Returns [`RegressionError::ParseScore`] when the field does not exist or
/// is not a number.
pub fn parse_score(line: &str, separator: &str, parse_index: i32) -> Result<f64> {
    let parse_error = |reason: String| RegressionError::ParseScore {
        line: line.to_string(),
        reason,
    };
    let fields: Vec<&str> = line.trim().split(separator).collect();
    let position = if parse_index >= 0 {
        usize::try_from(parse_index).ok()
    } else {
        usize::try_from(parse_index.unsigned_abs())
            .ok()
            .and_then(|back| fields.len().checked_sub(back))
    };
    let field = position
        .and_then(|idx| fields.get(idx))
        .ok_or_else(|| {
            parse_error(format!(
                "no field {parse_index} among {} fields split by {separator:?}",
                fields.len()
            ))
        })?;
    field
        .trim()
        .parse::<f64>()
        .map_err(|e| parse_error(format!("field {field:?} is not a number: {e}")))
}

/// Runs the evaluator for every triple of a regression and judges the scores.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    settings: &'a HarnessSettings,
    executor: &'a CommandExecutor,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator.
    #[must_use]
    pub fn new(settings: &'a HarnessSettings, executor: &'a CommandExecutor) -> Self {
        Self { settings, executor }
    }

    /// Evaluate every (method, topic set, metric) triple of `config`.
    #[must_use]
    pub fn evaluate(&self, config: &RegressionConfig) -> RegressionReport {
        tracing::info!("========== Verifying Fusion Results ==========");
        let mut report = RegressionReport::default();
        for method in &config.methods {
            for topic in &config.topics {
                for metric in &config.metrics {
                    match self.evaluate_triple(method, topic, metric) {
                        EvaluationOutcome::Judged(record) => report.record(record),
                        EvaluationOutcome::Skipped(_) => report.record_skipped(),
                        EvaluationOutcome::DryRun => {}
                    }
                }
            }
        }
        report
    }

    /// Evaluate a single triple.
    #[must_use]
    pub fn evaluate_triple(
        &self,
        method: &FusionMethodSpec,
        topic: &TopicSet,
        metric: &MetricSpec,
    ) -> EvaluationOutcome {
        let qrels = self.settings.qrels_path(&topic.qrel);
        let command = evaluation_command(metric, &qrels, &method.output);

        if self.executor.is_dry_run() {
            tracing::info!(command = %command.command_line(), "dry run");
            return EvaluationOutcome::DryRun;
        }

        match self.measure(&command, metric) {
            Ok(actual) => {
                let Some(expected) = method.expected().get(&metric.metric, &topic.id) else {
                    return skip(
                        method,
                        topic,
                        metric,
                        "no expected score recorded".to_string(),
                    );
                };
                let precision = metric.metric_precision;
                EvaluationOutcome::Judged(VerdictRecord::judge(
                    method.name,
                    topic.id.as_str(),
                    metric.metric.as_str(),
                    round_to(expected, precision),
                    round_to(actual, precision),
                    &self.settings.tolerance,
                ))
            }
            Err(error) => skip(method, topic, metric, error.to_string()),
        }
    }

    fn measure(&self, command: &InvocationSpec, metric: &MetricSpec) -> Result<f64> {
        let output = self.executor.capture(command)?;
        let line = last_result_line(&output)
            .ok_or_else(|| RegressionError::EmptyOutput(command.command_line()))?;
        parse_score(line, &metric.separator, metric.parse_index)
    }
}

fn skip(
    method: &FusionMethodSpec,
    topic: &TopicSet,
    metric: &MetricSpec,
    reason: String,
) -> EvaluationOutcome {
    tracing::error!(
        method = %method.name,
        topic = %topic.id,
        metric = %metric.metric,
        "failed to evaluate: {reason}"
    );
    EvaluationOutcome::Skipped(reason)
}
