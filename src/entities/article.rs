//! Test article records and sample accounting
//!
//! A test article is one unit under test: serial number, lot, outcome,
//! and optionally a measured value for variable-data criteria. Articles
//! are constructed fresh per report from ingested tabular data and never
//! persisted. Sample accounting reduces a set of articles to the
//! immutable `SampleSummary` the statistical stages consume.

use serde::{Deserialize, Serialize};

use crate::core::error::AnalysisError;

/// Outcome recorded for a single test article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Met the acceptance requirement
    Pass,
    /// Failed the acceptance requirement (defective unit)
    Fail,
    /// Lost to a test-method fault and replaced with another unit
    LossReplaced,
    /// Lost to a test-method fault and not replaced
    LossNotReplaced,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
            Outcome::LossReplaced => write!(f, "loss_replaced"),
            Outcome::LossNotReplaced => write!(f, "loss_not_replaced"),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = AnalysisError;

    /// Accepts the engine vocabulary plus the spreadsheet forms the
    /// legacy test-data sheets use ("PASS", "FAIL", "TML", "TML-R").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pass" => Ok(Outcome::Pass),
            "fail" => Ok(Outcome::Fail),
            "loss_replaced" | "tml_replaced" | "tml_r" => Ok(Outcome::LossReplaced),
            "loss_not_replaced" | "tml_not_replaced" | "tml" | "test_method_loss" => {
                Ok(Outcome::LossNotReplaced)
            }
            _ => Err(AnalysisError::invalid(format!(
                "unrecognized outcome '{}' (expected pass, fail, tml, tml-r, loss_replaced or loss_not_replaced)",
                s
            ))),
        }
    }
}

impl Outcome {
    /// Test-method losses are excluded from the statistical population
    pub fn is_loss(&self) -> bool {
        matches!(self, Outcome::LossReplaced | Outcome::LossNotReplaced)
    }
}

/// A single unit under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestArticle {
    /// Serial number of the unit
    pub serial: String,

    /// Lot or ER number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,

    /// Recorded outcome
    pub outcome: Outcome,

    /// Measured value, for variable-data criteria
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<f64>,

    /// Requirement IDs this article's test covers; empty means the
    /// article counts toward every criterion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
}

impl TestArticle {
    /// Create an article with just a serial number and outcome
    pub fn new(serial: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            serial: serial.into(),
            lot: None,
            outcome,
            measured: None,
            requirements: Vec::new(),
        }
    }

    /// Attach a measured value
    pub fn with_measured(mut self, value: f64) -> Self {
        self.measured = Some(value);
        self
    }

    /// Attach a requirement ID
    pub fn with_requirement(mut self, req: impl Into<String>) -> Self {
        self.requirements.push(req.into());
        self
    }
}

/// Sample accounting derived from a set of test articles
///
/// Immutable once computed; a pure function of the input set, independent
/// of article order (defective serials are reported sorted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSummary {
    /// Units that entered the test
    pub initial_sample_size: usize,

    /// Test-method losses that were replaced
    pub losses_replaced: usize,

    /// Test-method losses that were not replaced
    pub losses_not_replaced: usize,

    /// Units counted for the statistics: initial minus unreplaced losses
    pub actual_sample_size: usize,

    /// Units that passed
    pub pass_count: usize,

    /// Units that failed
    pub defective_count: usize,

    /// Serial numbers of the defective units, sorted
    pub defective_serials: Vec<String>,
}

impl SampleSummary {
    /// Reduce a set of articles to its sample accounting.
    ///
    /// Fails with `InvalidInput` when no articles remain in the actual
    /// sample (empty input, or every unit lost without replacement).
    pub fn from_articles(articles: &[TestArticle]) -> Result<Self, AnalysisError> {
        let initial_sample_size = articles.len();
        let mut losses_replaced = 0;
        let mut losses_not_replaced = 0;
        let mut pass_count = 0;
        let mut defective_serials = Vec::new();

        for article in articles {
            match article.outcome {
                Outcome::Pass => pass_count += 1,
                Outcome::Fail => defective_serials.push(article.serial.clone()),
                Outcome::LossReplaced => losses_replaced += 1,
                Outcome::LossNotReplaced => losses_not_replaced += 1,
            }
        }

        if initial_sample_size <= losses_not_replaced {
            return Err(AnalysisError::invalid(format!(
                "actual sample size is zero ({} articles, {} unreplaced losses)",
                initial_sample_size, losses_not_replaced
            )));
        }

        defective_serials.sort();

        Ok(Self {
            initial_sample_size,
            losses_replaced,
            losses_not_replaced,
            actual_sample_size: initial_sample_size - losses_not_replaced,
            pass_count,
            defective_count: defective_serials.len(),
            defective_serials,
        })
    }

    /// Total test-method losses, replaced or not
    pub fn loss_count(&self) -> usize {
        self.losses_replaced + self.losses_not_replaced
    }

    /// Pass rate over the actual sample, as a percentage
    pub fn pass_rate(&self) -> f64 {
        (self.pass_count as f64 / self.actual_sample_size as f64) * 100.0
    }
}
