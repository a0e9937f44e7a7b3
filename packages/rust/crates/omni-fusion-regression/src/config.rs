//! Regression configuration model.
//!
//! A regression file lists the input runs, the fusion methods to exercise
//! (with their expected scores), the topic sets to evaluate against, and the
//! metrics to extract from the evaluator output.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};

const DEFAULT_K: u32 = 1000;
const DEFAULT_DEPTH: u32 = 1000;
const DEFAULT_RRF_K: u32 = 60;
const DEFAULT_ALPHA: f64 = 0.5;

/// Fusion methods understood by the regression files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethodKind {
    /// Reciprocal rank fusion.
    Rrf,
    /// Score averaging.
    Average,
    /// Weighted linear combination of two runs.
    Interpolation,
    /// Min-max normalization before averaging.
    Normalize,
}

impl FusionMethodKind {
    /// Name used on fusion command lines and in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rrf => "rrf",
            Self::Average => "average",
            Self::Interpolation => "interpolation",
            Self::Normalize => "normalize",
        }
    }
}

impl fmt::Display for FusionMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A previously produced run file that fusion reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunFileRef {
    /// Path to the TREC-format run.
    pub file: PathBuf,
}

/// A named group of queries and its relevance judgments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicSet {
    /// Topic set identifier (e.g. `dl19-passage`).
    pub id: String,
    /// Qrels path, relative to the qrels root.
    pub qrel: PathBuf,
}

/// How a metric score is obtained from the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricSpec {
    /// Metric name, as used in each method's `results` table.
    pub metric: String,
    /// Evaluator executable (e.g. `bin/trec_eval`).
    pub command: String,
    /// Evaluator flags placed before the qrels path.
    #[serde(default)]
    pub params: Option<String>,
    /// Field separator of the evaluator's result line.
    pub separator: String,
    /// Field holding the score; negative values count from the end.
    pub parse_index: i32,
    /// Decimal places both scores are rounded to before comparison.
    pub metric_precision: u32,
}

/// Expected scores for one metric, as written in the regression file.
///
/// The positional form is matched against `topics` by index; the keyed form
/// names topic ids directly. Both are resolved into [`ExpectedResults`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExpectedScores {
    /// One score per topic set, in topic order.
    Positional(Vec<f64>),
    /// Scores keyed by topic id.
    Keyed(BTreeMap<String, f64>),
}

/// Expected scores keyed by metric, then topic id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedResults(BTreeMap<String, BTreeMap<String, f64>>);

impl ExpectedResults {
    /// Expected score for a metric on a topic set.
    #[must_use]
    pub fn get(&self, metric: &str, topic: &str) -> Option<f64> {
        self.0.get(metric).and_then(|by_topic| by_topic.get(topic)).copied()
    }

    /// Record an expected score.
    pub fn insert(&mut self, metric: impl Into<String>, topic: impl Into<String>, score: f64) {
        self.0
            .entry(metric.into())
            .or_default()
            .insert(topic.into(), score);
    }

    /// Number of (metric, topic) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Whether no expectations are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One fusion method under test.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FusionMethodSpec {
    /// Fusion method.
    pub name: FusionMethodKind,
    /// Where the fused run is written.
    pub output: PathBuf,
    /// Number of documents kept per query.
    #[serde(default = "default_k")]
    pub k: u32,
    /// Pool depth read from each input run.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// RRF rank constant.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    /// Interpolation weight of the first run.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(rename = "results", default)]
    raw_results: BTreeMap<String, ExpectedScores>,
    #[serde(skip)]
    expected: ExpectedResults,
}

fn default_k() -> u32 {
    DEFAULT_K
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

fn default_rrf_k() -> u32 {
    DEFAULT_RRF_K
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

impl FusionMethodSpec {
    /// Resolved expected scores (metric → topic id → score).
    #[must_use]
    pub fn expected(&self) -> &ExpectedResults {
        &self.expected
    }

    fn resolve_expected(&mut self, topics: &[TopicSet], metrics: &[MetricSpec]) -> Result<()> {
        let mut expected = ExpectedResults::default();
        for metric in metrics {
            let Some(scores) = self.raw_results.get(&metric.metric) else {
                return Err(RegressionError::InvalidConfig(format!(
                    "method `{}` has no expected results for metric `{}`",
                    self.name, metric.metric
                )));
            };
            match scores {
                ExpectedScores::Positional(values) => {
                    if values.len() != topics.len() {
                        return Err(RegressionError::InvalidConfig(format!(
                            "method `{}` metric `{}` lists {} expected scores for {} topic sets",
                            self.name,
                            metric.metric,
                            values.len(),
                            topics.len()
                        )));
                    }
                    for (topic, score) in topics.iter().zip(values) {
                        expected.insert(metric.metric.as_str(), topic.id.as_str(), *score);
                    }
                }
                ExpectedScores::Keyed(by_topic) => {
                    if let Some(unknown) = by_topic
                        .keys()
                        .find(|id| !topics.iter().any(|t| &t.id == *id))
                    {
                        return Err(RegressionError::InvalidConfig(format!(
                            "method `{}` metric `{}` names unknown topic set `{unknown}`",
                            self.name, metric.metric
                        )));
                    }
                    for topic in topics {
                        let Some(score) = by_topic.get(&topic.id) else {
                            return Err(RegressionError::InvalidConfig(format!(
                                "method `{}` metric `{}` has no expected score for topic set `{}`",
                                self.name, metric.metric, topic.id
                            )));
                        };
                        expected.insert(metric.metric.as_str(), topic.id.as_str(), *score);
                    }
                }
            }
        }
        self.expected = expected;
        Ok(())
    }
}

/// A complete fusion regression definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegressionConfig {
    /// Input run files shared by every method.
    pub runs: Vec<RunFileRef>,
    /// Fusion methods under test.
    pub methods: Vec<FusionMethodSpec>,
    /// Topic sets to evaluate on.
    pub topics: Vec<TopicSet>,
    /// Metrics to verify.
    pub metrics: Vec<MetricSpec>,
}

impl RegressionConfig {
    /// Load, validate, and resolve a regression file.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::ConfigNotFound`] if the file is missing,
    /// and a read, parse, or validation error otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(RegressionError::ConfigNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path).map_err(|source| RegressionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_yaml::from_str(&raw).map_err(|source| RegressionError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.finish()
    }

    /// Parse, validate, and resolve a regression definition from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed YAML or missing required keys, and
    /// [`RegressionError::InvalidConfig`] when validation fails.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(raw).map_err(|source| RegressionError::ConfigParse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        config.finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.validate()?;
        for method in &mut self.methods {
            method.resolve_expected(&self.topics, &self.metrics)?;
        }
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        for (section, len) in [
            ("runs", self.runs.len()),
            ("methods", self.methods.len()),
            ("topics", self.topics.len()),
            ("metrics", self.metrics.len()),
        ] {
            if len == 0 {
                return Err(RegressionError::InvalidConfig(format!(
                    "`{section}` must list at least one entry"
                )));
            }
        }

        let mut topic_ids = HashSet::new();
        for topic in &self.topics {
            if !topic_ids.insert(topic.id.as_str()) {
                return Err(RegressionError::InvalidConfig(format!(
                    "duplicate topic set id `{}`",
                    topic.id
                )));
            }
        }

        let mut metric_names = HashSet::new();
        for metric in &self.metrics {
            if !metric_names.insert(metric.metric.as_str()) {
                return Err(RegressionError::InvalidConfig(format!(
                    "duplicate metric `{}`",
                    metric.metric
                )));
            }
            if metric.separator.is_empty() {
                return Err(RegressionError::InvalidConfig(format!(
                    "metric `{}` has an empty separator",
                    metric.metric
                )));
            }
        }

        for method in &self.methods {
            if method.k == 0 {
                return Err(RegressionError::InvalidConfig(format!(
                    "method `{}`: k must be greater than 0",
                    method.name
                )));
            }
            if method.depth == 0 {
                return Err(RegressionError::InvalidConfig(format!(
                    "method `{}`: depth must be greater than 0",
                    method.name
                )));
            }
            if !(0.0..=1.0).contains(&method.alpha) {
                return Err(RegressionError::InvalidConfig(format!(
                    "method `{}`: alpha must lie in [0, 1], got {}",
                    method.name, method.alpha
                )));
            }
        }
        Ok(())
    }

    /// Paths of the input runs, in configuration order.
    #[must_use]
    pub fn run_paths(&self) -> Vec<&Path> {
        self.runs.iter().map(|run| run.file.as_path()).collect()
    }

    /// Run files that do not exist on disk.
    #[must_use]
    pub fn missing_run_files(&self) -> Vec<PathBuf> {
        self.runs
            .iter()
            .filter(|run| !run.file.exists())
            .map(|run| run.file.clone())
            .collect()
    }

    /// Fail when any input run is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::MissingRunFiles`] listing every absent run.
    pub fn preflight(&self) -> Result<()> {
        let missing = self.missing_run_files();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegressionError::MissingRunFiles(missing))
        }
    }
}
