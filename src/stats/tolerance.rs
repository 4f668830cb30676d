//! Normal tolerance intervals for variable (continuous) data
//!
//! One-sided factors use the standard noncentral-t-based approximation
//! (Natrella, "Experimental Statistics", 1963):
//!
//!   k = (z_r + sqrt(z_r^2 - a b)) / a
//!   a = 1 - z_c^2 / (2 (n - 1)),  b = z_r^2 - z_c^2 / n
//!
//! Two-sided factors use Howe's approximation with a Wilson-Hilferty
//! chi-square quantile:
//!
//!   k = z_{(1+r)/2} * sqrt((n - 1) (1 + 1/n) / chi2_{1-c, n-1})
//!
//! The achieved confidence at a required specification bound is recovered
//! by inverting the factor over the confidence argument (the factor is
//! monotone increasing in confidence).

use serde::{Deserialize, Serialize};

use crate::core::error::AnalysisError;
use crate::stats::descriptive::{self, FiveNumberSummary};
use crate::stats::special;

/// Which side(s) of the distribution the criterion bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sidedness {
    /// One-sided lower bound (LSL)
    Lower,
    /// One-sided upper bound (USL)
    Upper,
    /// Two-sided interval (LSL and USL)
    TwoSided,
}

impl std::fmt::Display for Sidedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sidedness::Lower => write!(f, "lower"),
            Sidedness::Upper => write!(f, "upper"),
            Sidedness::TwoSided => write!(f, "two_sided"),
        }
    }
}

/// Specification limits for a variable criterion
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    /// Lower specification limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,

    /// Upper specification limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

/// How to treat a constant (zero standard deviation) sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegeneracyPolicy {
    /// Report a point interval at the mean and set the degenerate flag
    #[default]
    Flag,
    /// Fail with a numerical error
    Strict,
}

/// Result of a variable-data tolerance-interval analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableResult {
    /// Number of measured values used
    pub sample_size: usize,

    /// Sample mean
    pub mean: f64,

    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,

    /// Population proportion the interval must cover
    pub proportion: f64,

    /// Confidence the interval is computed at
    pub confidence: f64,

    /// Tolerance factor k
    pub k_factor: f64,

    /// Lower tolerance bound (mean - k s), when the sidedness has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,

    /// Upper tolerance bound (mean + k s), when the sidedness has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,

    /// Five-number summary of the measured values
    pub summary: FiveNumberSummary,

    /// True when the sample was constant and the interval collapsed to
    /// a point at the mean
    pub degenerate: bool,

    /// Confidence attained at the required specification bound, when
    /// limits were supplied and the sample is not degenerate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achieved_confidence: Option<f64>,
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

/// One-sided normal tolerance factor (Natrella approximation).
pub fn one_sided_k(n: usize, proportion: f64, confidence: f64) -> Result<f64, AnalysisError> {
    if n < 2 {
        return Err(AnalysisError::invalid(format!(
            "tolerance factor requires at least 2 samples, got {}",
            n
        )));
    }
    check_probability(proportion, "proportion")?;
    check_probability(confidence, "confidence")?;

    let z_r = special::inverse_normal_cdf(proportion);
    let z_c = special::inverse_normal_cdf(confidence);
    let nu = (n - 1) as f64;

    let a = 1.0 - z_c * z_c / (2.0 * nu);
    if a <= 0.0 {
        return Err(AnalysisError::numerical(format!(
            "one-sided tolerance factor approximation is invalid for n = {} at {:.4} confidence; a larger sample is required",
            n, confidence
        )));
    }
    let b = z_r * z_r - z_c * z_c / n as f64;
    let disc = z_r * z_r - a * b;
    if disc < 0.0 {
        return Err(AnalysisError::numerical(format!(
            "one-sided tolerance factor approximation is invalid for n = {} at {:.4} confidence / {:.4} proportion",
            n, confidence, proportion
        )));
    }
    // The factor solves a k^2 - 2 z_r k + b = 0; the upper root applies
    // at confidence >= 0.5, the lower root below (k(0.5) = z_r exactly).
    if confidence >= 0.5 {
        Ok((z_r + disc.sqrt()) / a)
    } else {
        Ok((z_r - disc.sqrt()) / a)
    }
}

/// Two-sided normal tolerance factor (Howe approximation).
pub fn two_sided_k(n: usize, proportion: f64, confidence: f64) -> Result<f64, AnalysisError> {
    if n < 2 {
        return Err(AnalysisError::invalid(format!(
            "tolerance factor requires at least 2 samples, got {}",
            n
        )));
    }
    check_probability(proportion, "proportion")?;
    check_probability(confidence, "confidence")?;

    let z = special::inverse_normal_cdf((1.0 + proportion) / 2.0);
    let nu = (n - 1) as f64;
    let chi2 = special::chi_square_quantile(1.0 - confidence, nu);
    Ok(z * (nu * (1.0 + 1.0 / n as f64) / chi2).sqrt())
}

fn k_for(n: usize, proportion: f64, confidence: f64, sidedness: Sidedness) -> Option<f64> {
    let k = match sidedness {
        Sidedness::Lower | Sidedness::Upper => one_sided_k(n, proportion, confidence),
        Sidedness::TwoSided => two_sided_k(n, proportion, confidence),
    };
    k.ok()
}

/// Confidence attained for a margin of `margin_k` standard deviations
/// between the mean and the binding specification limit.
///
/// Inverts the tolerance factor over the confidence argument by
/// bisection; clamped to [~0, ~1] at the bracket edges. The factor
/// approximation becomes invalid at extreme confidence for small n,
/// which is treated as an infinite factor (the bisection stays below it).
pub fn achieved_confidence_for_margin(
    n: usize,
    proportion: f64,
    sidedness: Sidedness,
    margin_k: f64,
) -> f64 {
    if margin_k <= 0.0 {
        return 0.0;
    }

    let mut lo = 1.0e-9_f64;
    let mut hi = 1.0 - 1.0e-9_f64;

    match k_for(n, proportion, lo, sidedness) {
        Some(k) if k >= margin_k => return 0.0,
        _ => {}
    }
    if let Some(k) = k_for(n, proportion, hi, sidedness) {
        if k < margin_k {
            return hi;
        }
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        // None means the approximation broke down above the valid range;
        // the factor is effectively infinite there.
        let k = k_for(n, proportion, mid, sidedness).unwrap_or(f64::INFINITY);
        if k < margin_k {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1.0e-12 {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Compute a normal tolerance interval over `values`.
///
/// `limits` feeds the achieved-confidence computation only; the Met/NotMet
/// comparison itself belongs to the acceptance evaluation.
pub fn interval(
    values: &[f64],
    proportion: f64,
    confidence: f64,
    sidedness: Sidedness,
    limits: Option<&SpecLimits>,
    policy: DegeneracyPolicy,
) -> Result<VariableResult, AnalysisError> {
    if values.len() < 2 {
        return Err(AnalysisError::invalid(format!(
            "tolerance interval requires at least 2 measured values, got {}",
            values.len()
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(AnalysisError::invalid(format!(
            "measured values must be finite, got {}",
            bad
        )));
    }
    check_probability(proportion, "proportion")?;
    check_probability(confidence, "confidence")?;

    let n = values.len();
    let mean = descriptive::mean(values);
    let std_dev = descriptive::sample_std_dev(values);

    let k = match sidedness {
        Sidedness::Lower | Sidedness::Upper => one_sided_k(n, proportion, confidence)?,
        Sidedness::TwoSided => two_sided_k(n, proportion, confidence)?,
    };

    let degenerate = std_dev == 0.0;
    if degenerate && policy == DegeneracyPolicy::Strict {
        return Err(AnalysisError::numerical(
            "constant sample: zero standard deviation",
        ));
    }

    let lower_bound = match sidedness {
        Sidedness::Lower | Sidedness::TwoSided => Some(mean - k * std_dev),
        Sidedness::Upper => None,
    };
    let upper_bound = match sidedness {
        Sidedness::Upper | Sidedness::TwoSided => Some(mean + k * std_dev),
        Sidedness::Lower => None,
    };

    let achieved_confidence = if degenerate {
        None
    } else {
        margin_in_sigma(mean, std_dev, sidedness, limits)
            .map(|m| achieved_confidence_for_margin(n, proportion, sidedness, m))
    };

    Ok(VariableResult {
        sample_size: n,
        mean,
        std_dev,
        proportion,
        confidence,
        k_factor: k,
        lower_bound,
        upper_bound,
        summary: descriptive::five_number_summary(values),
        degenerate,
        achieved_confidence,
    })
}

/// Distance from the mean to the binding specification limit, in
/// standard-deviation units. None when the applicable limit is absent.
fn margin_in_sigma(
    mean: f64,
    std_dev: f64,
    sidedness: Sidedness,
    limits: Option<&SpecLimits>,
) -> Option<f64> {
    let limits = limits?;
    match sidedness {
        Sidedness::Lower => limits.lower.map(|lsl| (mean - lsl) / std_dev),
        Sidedness::Upper => limits.upper.map(|usl| (usl - mean) / std_dev),
        Sidedness::TwoSided => match (limits.lower, limits.upper) {
            (Some(lsl), Some(usl)) => {
                Some(((mean - lsl) / std_dev).min((usl - mean) / std_dev))
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 120 values with mean exactly 2.5 and sample std dev exactly 0.06
    fn synthetic_sample() -> Vec<f64> {
        let delta = 0.06 * (119.0_f64 / 120.0).sqrt();
        let mut values = Vec::with_capacity(120);
        for _ in 0..60 {
            values.push(2.5 + delta);
            values.push(2.5 - delta);
        }
        values
    }

    #[test]
    fn test_one_sided_k_reference_value() {
        // n=120, proportion 0.95, confidence 0.90
        let k = one_sided_k(120, 0.95, 0.90).unwrap();
        assert!((k - 1.8371).abs() < 1e-3, "got {k}");
    }

    #[test]
    fn test_one_sided_k_n20_9595() {
        // Tabulated one-sided factor for n=20, 95/95 is 2.396; the
        // Natrella approximation lands within one percent
        let k = one_sided_k(20, 0.95, 0.95).unwrap();
        assert!((k - 2.396).abs() < 0.03, "got {k}");
    }

    #[test]
    fn test_two_sided_k_n20_9595() {
        // Tabulated two-sided factor for n=20, 95/95 is 2.752
        let k = two_sided_k(20, 0.95, 0.95).unwrap();
        assert!((k - 2.752).abs() < 0.02, "got {k}");
    }

    #[test]
    fn test_two_sided_exceeds_one_sided() {
        for n in [10, 30, 120] {
            let k1 = one_sided_k(n, 0.95, 0.95).unwrap();
            let k2 = two_sided_k(n, 0.95, 0.95).unwrap();
            assert!(k2 > k1, "n={n}: {k2} <= {k1}");
        }
    }

    #[test]
    fn test_k_monotone() {
        // Shrinks with sample size
        assert!(one_sided_k(10, 0.95, 0.90).unwrap() > one_sided_k(100, 0.95, 0.90).unwrap());
        assert!(two_sided_k(10, 0.95, 0.90).unwrap() > two_sided_k(100, 0.95, 0.90).unwrap());
        // Grows with confidence
        assert!(one_sided_k(30, 0.95, 0.99).unwrap() > one_sided_k(30, 0.95, 0.80).unwrap());
        // Grows with covered proportion
        assert!(one_sided_k(30, 0.99, 0.90).unwrap() > one_sided_k(30, 0.90, 0.90).unwrap());
    }

    #[test]
    fn test_one_sided_breakdown_small_n() {
        // n=2 at 99% confidence: the approximation's denominator goes
        // non-positive
        assert!(matches!(
            one_sided_k(2, 0.95, 0.99),
            Err(AnalysisError::Numerical { .. })
        ));
    }

    #[test]
    fn test_interval_lower_bound_regression() {
        // Documented magnitude: n=120, 95% proportion, 90% confidence,
        // mean 2.5, s 0.06 -> lower bound about 2.39
        let values = synthetic_sample();
        let result = interval(
            &values,
            0.95,
            0.90,
            Sidedness::Lower,
            None,
            DegeneracyPolicy::Flag,
        )
        .unwrap();

        assert_eq!(result.sample_size, 120);
        assert!((result.mean - 2.5).abs() < 1e-12);
        assert!((result.std_dev - 0.06).abs() < 1e-12);
        let lower = result.lower_bound.unwrap();
        assert!((lower - 2.39).abs() < 0.01, "got {lower}");
        assert!(result.upper_bound.is_none());
        assert!(!result.degenerate);
    }

    #[test]
    fn test_interval_two_sided_bounds() {
        let values = synthetic_sample();
        let result = interval(
            &values,
            0.95,
            0.90,
            Sidedness::TwoSided,
            None,
            DegeneracyPolicy::Flag,
        )
        .unwrap();
        let lower = result.lower_bound.unwrap();
        let upper = result.upper_bound.unwrap();
        assert!((upper + lower - 5.0).abs() < 1e-9); // symmetric about the mean
        assert!(upper > lower);
    }

    #[test]
    fn test_achieved_confidence_roundtrip() {
        // The margin equal to the k factor recovers the confidence it
        // was computed at
        let k = one_sided_k(120, 0.95, 0.90).unwrap();
        let c = achieved_confidence_for_margin(120, 0.95, Sidedness::Lower, k);
        assert!((c - 0.90).abs() < 1e-6, "got {c}");

        let k = two_sided_k(40, 0.99, 0.95).unwrap();
        let c = achieved_confidence_for_margin(40, 0.99, Sidedness::TwoSided, k);
        assert!((c - 0.95).abs() < 1e-6, "got {c}");
    }

    #[test]
    fn test_achieved_confidence_against_limits() {
        let values = synthetic_sample();
        let limits = SpecLimits {
            lower: Some(2.2),
            upper: None,
        };
        let result = interval(
            &values,
            0.95,
            0.90,
            Sidedness::Lower,
            Some(&limits),
            DegeneracyPolicy::Flag,
        )
        .unwrap();
        // Margin is (2.5 - 2.2) / 0.06 = 5 sigma, far beyond k = 1.84
        let achieved = result.achieved_confidence.unwrap();
        assert!(achieved > 0.99, "got {achieved}");
    }

    #[test]
    fn test_achieved_confidence_zero_when_mean_out_of_spec() {
        let c = achieved_confidence_for_margin(50, 0.95, Sidedness::Lower, -0.5);
        assert_eq!(c, 0.0);
    }

    #[test]
    fn test_degenerate_sample_flagged() {
        let values = vec![3.2; 10];
        let result = interval(
            &values,
            0.95,
            0.90,
            Sidedness::TwoSided,
            None,
            DegeneracyPolicy::Flag,
        )
        .unwrap();
        assert!(result.degenerate);
        assert_eq!(result.lower_bound, Some(3.2));
        assert_eq!(result.upper_bound, Some(3.2));
        assert!(result.achieved_confidence.is_none());
    }

    #[test]
    fn test_degenerate_sample_strict_fails() {
        let values = vec![3.2; 10];
        let err = interval(
            &values,
            0.95,
            0.90,
            Sidedness::Lower,
            None,
            DegeneracyPolicy::Strict,
        );
        assert!(matches!(err, Err(AnalysisError::Numerical { .. })));
    }

    #[test]
    fn test_invalid_inputs() {
        let ok = [1.0, 2.0, 3.0];
        assert!(matches!(
            interval(&[], 0.95, 0.9, Sidedness::Lower, None, DegeneracyPolicy::Flag),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            interval(&[1.0], 0.95, 0.9, Sidedness::Lower, None, DegeneracyPolicy::Flag),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            interval(&ok, 0.0, 0.9, Sidedness::Lower, None, DegeneracyPolicy::Flag),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            interval(&ok, 1.0, 0.9, Sidedness::Lower, None, DegeneracyPolicy::Flag),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            interval(&ok, 0.95, 1.2, Sidedness::Lower, None, DegeneracyPolicy::Flag),
            Err(AnalysisError::InvalidInput { .. })
        ));
        assert!(matches!(
            interval(
                &[1.0, f64::NAN, 2.0],
                0.95,
                0.9,
                Sidedness::Lower,
                None,
                DegeneracyPolicy::Flag
            ),
            Err(AnalysisError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_idempotent_bit_identical() {
        let values = synthetic_sample();
        let a = interval(&values, 0.95, 0.90, Sidedness::Lower, None, DegeneracyPolicy::Flag)
            .unwrap();
        let b = interval(&values, 0.95, 0.90, Sidedness::Lower, None, DegeneracyPolicy::Flag)
            .unwrap();
        assert_eq!(
            a.lower_bound.unwrap().to_bits(),
            b.lower_bound.unwrap().to_bits()
        );
        assert_eq!(a.k_factor.to_bits(), b.k_factor.to_bits());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let values = synthetic_sample();
        let result = interval(
            &values,
            0.95,
            0.90,
            Sidedness::TwoSided,
            None,
            DegeneracyPolicy::Flag,
        )
        .unwrap();
        let yaml = serde_yml::to_string(&result).unwrap();
        let parsed: VariableResult = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(result, parsed);
    }

    #[test]
    fn test_sidedness_serialization() {
        assert_eq!(serde_yml::to_string(&Sidedness::Lower).unwrap().trim(), "lower");
        assert_eq!(
            serde_yml::to_string(&Sidedness::TwoSided).unwrap().trim(),
            "two_sided"
        );
    }
}
