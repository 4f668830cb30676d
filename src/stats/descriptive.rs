//! Descriptive statistics over measured values
//!
//! Mean, sample standard deviation, and quantiles. Quantiles use linear
//! interpolation between order statistics (the "type 7" rule): for
//! probability p over n sorted values, h = (n - 1) * p and the result
//! interpolates between the floor(h)-th and ceil(h)-th order statistics.
//! Several quantile conventions exist and silently disagree; this one is
//! fixed here and locked in by the tests.

use serde::{Deserialize, Serialize};

/// Arithmetic mean. Callers validate non-emptiness upstream.
pub fn mean(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    debug_assert!(values.len() >= 2);
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics (type 7).
pub fn quantile(values: &[f64], p: f64) -> f64 {
    debug_assert!(!values.is_empty());
    debug_assert!((0.0..=1.0).contains(&p));
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
    sorted_quantile(&sorted, p)
}

fn sorted_quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let frac = h - lo as f64;
    if lo + 1 < n {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    } else {
        sorted[n - 1]
    }
}

/// Five-number summary of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Compute the five-number summary with type-7 quantiles.
pub fn five_number_summary(values: &[f64]) -> FiveNumberSummary {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));
    FiveNumberSummary {
        min: sorted[0],
        q1: sorted_quantile(&sorted, 0.25),
        median: sorted_quantile(&sorted, 0.5),
        q3: sorted_quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}
