//! Verdict records and the end-of-run summary.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::config::FusionMethodKind;
use crate::error::{RegressionError, Result};
use crate::tolerance::Tolerance;

/// Outcome of one (method, topic set, metric) comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Score matched or improved on the expectation.
    Pass,
    /// Score fell below the expectation.
    Fail,
}

impl Verdict {
    /// Whether this verdict passes.
    #[must_use]
    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }

    /// Marker prefixed to per-triple log lines.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Pass => "  [OK]",
            Self::Fail => "[FAIL]",
        }
    }
}

/// One verified score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictRecord {
    /// Fusion method.
    pub method: FusionMethodKind,
    /// Topic set id.
    pub topic: String,
    /// Metric name.
    pub metric: String,
    /// Expected score, rounded to the metric precision.
    pub expected: f64,
    /// Measured score, rounded to the metric precision.
    pub actual: f64,
    /// `|expected - actual|`.
    pub delta: f64,
    /// Pass or fail.
    pub verdict: Verdict,
}

impl VerdictRecord {
    /// Judge already-rounded scores.
    #[must_use]
    pub fn judge(
        method: FusionMethodKind,
        topic: impl Into<String>,
        metric: impl Into<String>,
        expected: f64,
        actual: f64,
        tolerance: &Tolerance,
    ) -> Self {
        Self {
            method,
            topic: topic.into(),
            metric: metric.into(),
            expected,
            actual,
            delta: (expected - actual).abs(),
            verdict: tolerance.verdict(expected, actual),
        }
    }

    /// Human-readable comparison, without the verdict marker.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "expected: {:.4} actual: {:.4} (delta={:.4}) - metric: {:<8} method: {} topics: {}",
            self.expected, self.actual, self.delta, self.metric, self.method, self.topic
        )
    }

    fn log(&self) {
        let line = format!("{} {}", self.verdict.marker(), self.describe());
        match self.verdict {
            Verdict::Pass => tracing::info!("{line}"),
            Verdict::Fail => tracing::error!("{line}"),
        }
    }
}

/// Verdicts accumulated over one regression run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegressionReport {
    verdicts: Vec<VerdictRecord>,
    skipped: usize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    passed: bool,
    total: usize,
    failures: usize,
    skipped: usize,
    verdicts: &'a [VerdictRecord],
}

impl RegressionReport {
    /// Append a verdict and log it.
    pub fn record(&mut self, record: VerdictRecord) {
        record.log();
        self.verdicts.push(record);
    }

    /// Count a triple that could not be evaluated.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// All verdicts, in evaluation order.
    #[must_use]
    pub fn verdicts(&self) -> &[VerdictRecord] {
        &self.verdicts
    }

    /// Number of skipped triples.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Failing verdicts.
    pub fn failures(&self) -> impl Iterator<Item = &VerdictRecord> {
        self.verdicts.iter().filter(|record| !record.verdict.is_pass())
    }

    /// Whether no verdict failed. Skipped triples do not count.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Process exit status for this report.
    ///
    /// Metric failures only change the status when `fail_on_mismatch` is set.
    #[must_use]
    pub fn exit_code(&self, fail_on_mismatch: bool) -> i32 {
        i32::from(fail_on_mismatch && !self.passed())
    }

    /// Log elapsed time and the single overall verdict line.
    pub fn log_summary(&self, started: Instant) {
        let failures = self.failures().count();
        tracing::info!(
            total = self.verdicts.len(),
            failures,
            skipped = self.skipped,
            "Total execution time: {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        if failures > 0 {
            tracing::error!("{} Some tests failed.", Verdict::Fail.marker());
        } else {
            tracing::info!("All tests passed successfully!");
        }
    }

    /// Serialize the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportDocument {
            passed: self.passed(),
            total: self.verdicts.len(),
            failures: self.failures().count(),
            skipped: self.skipped,
            verdicts: &self.verdicts,
        })
    }

    /// Write the JSON report to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::ReportWrite`] if serialization or the write fails.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let report_write = |reason: String| RegressionError::ReportWrite {
            path: path.to_path_buf(),
            reason,
        };
        let json = self.to_json().map_err(|e| report_write(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| report_write(e.to_string()))
    }
}
