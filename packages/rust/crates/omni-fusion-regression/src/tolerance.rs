//! Floating-point comparison used to judge metric scores.

use crate::report::Verdict;

const DEFAULT_REL_TOL: f64 = 1e-9;
const DEFAULT_ABS_TOL: f64 = 0.0;
/// Past this many decimals rounding cannot move any `f64`, subnormals included.
const MAX_ROUNDING_PRECISION: u32 = 340;

/// Whether `a` and `b` are equal within a relative or absolute tolerance.
///
/// True iff `|a - b| <= max(rel_tol * max(|a|, |b|), abs_tol)`. Symmetric in
/// `a` and `b`. Two zeros are always close; equal infinities are close; NaN is
/// never close to anything.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn is_close(a: f64, b: f64, rel_tol: f64, abs_tol: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let diff = (a - b).abs();
    diff <= (rel_tol * a.abs().max(b.abs())).max(abs_tol)
}

/// Round to `precision` decimal places.
///
/// Rounds the exact binary value, with exact ties going to even: `0.41235` is
/// stored just below the tie and becomes `0.4123`, `2.5` becomes `2`.
#[must_use]
pub fn round_to(value: f64, precision: u32) -> f64 {
    if !value.is_finite() || precision > MAX_ROUNDING_PRECISION {
        return value;
    }
    let decimals = usize::try_from(precision).unwrap_or(usize::MAX);
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// Tolerance applied when comparing expected and actual scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Relative tolerance.
    pub rel_tol: f64,
    /// Absolute tolerance.
    pub abs_tol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rel_tol: DEFAULT_REL_TOL,
            abs_tol: DEFAULT_ABS_TOL,
        }
    }
}

impl Tolerance {
    /// [`is_close`] with this tolerance.
    #[must_use]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        is_close(a, b, self.rel_tol, self.abs_tol)
    }

    /// Judge an actual score against its expectation.
    ///
    /// Passes when the scores are close, or when `actual` improves on
    /// `expected`.
    #[must_use]
    pub fn verdict(&self, expected: f64, actual: f64) -> Verdict {
        if self.is_close(expected, actual) || actual > expected {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}
