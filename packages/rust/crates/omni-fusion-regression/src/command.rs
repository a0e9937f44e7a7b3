//! Fusion command construction.

use crate::backend::FusionBackend;
use crate::config::{FusionMethodKind, RegressionConfig};

/// Methods that get a fusion command. `normalize` is configured in regression
/// files but is not fused by the harness.
pub const SUPPORTED_FUSION_METHODS: [FusionMethodKind; 3] = [
    FusionMethodKind::Rrf,
    FusionMethodKind::Average,
    FusionMethodKind::Interpolation,
];

/// An external command as an ordered list of tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    tokens: Vec<String>,
}

impl InvocationSpec {
    /// Wrap command tokens.
    #[must_use]
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Command tokens, executable first.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Single command line passed to the shell.
    #[must_use]
    pub fn command_line(&self) -> String {
        self.tokens.join(" ")
    }

    /// Token following the first occurrence of `flag`.
    #[must_use]
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.tokens
            .iter()
            .position(|token| token == flag)
            .and_then(|idx| self.tokens.get(idx + 1))
            .map(String::as_str)
    }

    /// Whether `flag` appears as a token.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.tokens.iter().any(|token| token == flag)
    }
}

/// Build one fusion command per supported method, in configuration order.
#[must_use]
pub fn build_fusion_commands(
    config: &RegressionConfig,
    backend: &dyn FusionBackend,
) -> Vec<InvocationSpec> {
    let runs = config.run_paths();
    let methods: Vec<_> = config
        .methods
        .iter()
        .filter(|method| SUPPORTED_FUSION_METHODS.contains(&method.name))
        .collect();

    let names: Vec<&str> = methods.iter().map(|method| method.name.as_str()).collect();
    tracing::info!(backend = backend.name(), methods = ?names, "testing fusion methods");

    methods
        .into_iter()
        .map(|method| backend.build(method, &runs))
        .collect()
}
