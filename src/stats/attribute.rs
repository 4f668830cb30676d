//! Attribute (pass/fail) reliability-confidence bounds
//!
//! For n test articles with d failures and a reliability target r, the
//! achieved one-sided confidence is the exact binomial tail
//!
//!   C = 1 - P(X <= d)  with  X ~ Binomial(n, 1 - r),
//!
//! evaluated through the regularized incomplete beta function so it stays
//! stable for n in the thousands. The dual Clopper-Pearson form - the
//! reliability lower bound demonstrated at a requested confidence - is
//! obtained by inverting the same function. The two directions agree
//! exactly: achieved_confidence(n, d, reliability_lower_bound(n, d, c)) = c.

use serde::{Deserialize, Serialize};

use crate::core::error::AnalysisError;
use crate::stats::special;

/// Result of an attribute-data reliability analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeResult {
    /// Actual sample size n
    pub sample_size: usize,

    /// Defective unit count d
    pub defective_count: usize,

    /// Reliability the criterion demands
    pub target_reliability: f64,

    /// Confidence the criterion demands
    pub target_confidence: f64,

    /// One-sided confidence achieved at the target reliability
    pub achieved_confidence: f64,

    /// Reliability lower bound demonstrated at the target confidence
    /// (Clopper-Pearson)
    pub reliability_bound: f64,
}

fn check_probability(value: f64, name: &str) -> Result<(), AnalysisError> {
    if !value.is_finite() || value <= 0.0 || value >= 1.0 {
        return Err(AnalysisError::invalid(format!(
            "{} must be in (0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_counts(n: usize, d: usize) -> Result<(), AnalysisError> {
    if n == 0 {
        return Err(AnalysisError::invalid("sample size must be positive"));
    }
    if d > n {
        return Err(AnalysisError::invalid(format!(
            "defective count {} exceeds sample size {}",
            d, n
        )));
    }
    Ok(())
}

/// Binomial CDF P(X <= d) for X ~ Binomial(n, p), via the incomplete
/// beta identity P(X <= d) = I_{1-p}(n - d, d + 1).
pub fn binomial_tail(d: usize, n: usize, p: f64) -> f64 {
    if d >= n {
        return 1.0;
    }
    if p <= 0.0 {
        return 1.0;
    }
    if p >= 1.0 {
        return 0.0;
    }
    special::regularized_incomplete_beta((n - d) as f64, (d + 1) as f64, 1.0 - p)
}

/// One-sided confidence achieved at reliability `reliability`, given
/// `d` failures in `n` trials.
///
/// The zero-failure case uses the closed form C = 1 - r^n directly.
pub fn achieved_confidence(n: usize, d: usize, reliability: f64) -> Result<f64, AnalysisError> {
    check_counts(n, d)?;
    check_probability(reliability, "reliability")?;

    if d == 0 {
        return Ok(1.0 - reliability.powi(n as i32));
    }
    if d == n {
        return Ok(0.0);
    }
    Ok(1.0 - binomial_tail(d, n, 1.0 - reliability))
}

/// Clopper-Pearson one-sided reliability lower bound at confidence
/// `confidence`, given `d` failures in `n` trials.
pub fn reliability_lower_bound(n: usize, d: usize, confidence: f64) -> Result<f64, AnalysisError> {
    check_counts(n, d)?;
    check_probability(confidence, "confidence")?;

    if d == n {
        return Ok(0.0);
    }
    if d == 0 {
        // Closed form: the bound solving 1 - r^n = c
        return Ok((1.0 - confidence).powf(1.0 / n as f64));
    }
    let p_upper =
        special::inverse_incomplete_beta((d + 1) as f64, (n - d) as f64, confidence);
    Ok(1.0 - p_upper)
}

/// Full attribute analysis: both duality directions at once.
pub fn analyze(
    n: usize,
    d: usize,
    reliability: f64,
    confidence: f64,
) -> Result<AttributeResult, AnalysisError> {
    let achieved = achieved_confidence(n, d, reliability)?;
    let bound = reliability_lower_bound(n, d, confidence)?;
    Ok(AttributeResult {
        sample_size: n,
        defective_count: d,
        target_reliability: reliability,
        target_confidence: confidence,
        achieved_confidence: achieved,
        reliability_bound: bound,
    })
}
