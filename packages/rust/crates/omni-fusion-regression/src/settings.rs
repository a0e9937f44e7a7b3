//! Harness settings.
//!
//! Resolves where regression files and qrels live, which executables
//! implement each fusion backend, and how scores are compared. Defaults match
//! an Anserini checkout; the CLI overrides individual fields.

use std::path::{Path, PathBuf};

use crate::tolerance::Tolerance;

const DEFAULT_CONFIG_DIR: &str = "src/main/resources/fusion_regression";
const DEFAULT_QRELS_ROOT: &str = "tools/topics-and-qrels";
const DEFAULT_SHELL: &str = "sh";
const DEFAULT_ANSERINI_COMMAND: &str = "bin/run.sh io.anserini.fusion.FuseRuns";
const DEFAULT_PYSERINI_COMMAND: &str = "python -m pyserini.fusion";

/// Runtime settings for one regression run.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    /// Directory holding `<name>.yaml` regression files.
    pub config_dir: PathBuf,
    /// Directory qrels paths are relative to.
    pub qrels_root: PathBuf,
    /// Shell used to run rendered command lines.
    pub shell: String,
    /// Command prefix of the native (Anserini) fusion tool.
    pub anserini_command: String,
    /// Command prefix of the alternate (Pyserini) fusion tool.
    pub pyserini_command: String,
    /// Score comparison tolerance.
    pub tolerance: Tolerance,
    /// Exit non-zero when any verdict fails.
    pub fail_on_mismatch: bool,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            qrels_root: PathBuf::from(DEFAULT_QRELS_ROOT),
            shell: DEFAULT_SHELL.to_string(),
            anserini_command: DEFAULT_ANSERINI_COMMAND.to_string(),
            pyserini_command: DEFAULT_PYSERINI_COMMAND.to_string(),
            tolerance: Tolerance::default(),
            fail_on_mismatch: false,
        }
    }
}

impl HarnessSettings {
    /// Path of the regression file selected by `name`.
    ///
    /// A bare name resolves to `<config_dir>/<name>.yaml`; an explicit
    /// `.yaml`/`.yml` path or an existing file is used as given.
    #[must_use]
    pub fn config_path(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        let has_yaml_ext = candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        if has_yaml_ext || candidate.is_file() {
            return candidate.to_path_buf();
        }
        self.config_dir.join(format!("{name}.yaml"))
    }

    /// Qrels path for a topic set entry.
    #[must_use]
    pub fn qrels_path(&self, qrel: &Path) -> PathBuf {
        if qrel.is_absolute() {
            qrel.to_path_buf()
        } else {
            self.qrels_root.join(qrel)
        }
    }
}
