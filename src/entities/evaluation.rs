//! Criterion evaluation records
//!
//! An evaluation ties one acceptance criterion to the sample accounting
//! and statistical result computed from a set of test articles, plus the
//! Met/NotMet verdict. Evaluations are built fresh per report request;
//! a whole report is a list of per-criterion entries where a failed
//! criterion carries its error marker instead of aborting the rest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::error::AnalysisError;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::article::{Outcome, SampleSummary, TestArticle};
use crate::entities::criterion::{AcceptanceCriterion, AnalysisType};
use crate::stats::attribute::{self, AttributeResult};
use crate::stats::tolerance::{self, DegeneracyPolicy, Sidedness, VariableResult};

/// Whether the criterion was met
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionVerdict {
    Met,
    NotMet,
}

impl std::fmt::Display for CriterionVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriterionVerdict::Met => write!(f, "met"),
            CriterionVerdict::NotMet => write!(f, "not_met"),
        }
    }
}

/// Statistical result of one criterion's analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Attribute(AttributeResult),
    Variable(VariableResult),
}

/// A completed criterion evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Unique identifier (EVAL-...)
    pub id: EntityId,

    /// Criterion this evaluation belongs to
    pub criterion: EntityId,

    /// Criterion description, carried for report rendering
    pub criterion_title: String,

    /// Requirement IDs the criterion verifies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,

    /// Sample accounting over the selected articles
    pub summary: SampleSummary,

    /// Attribute or variable statistical result
    pub outcome: AnalysisOutcome,

    /// Met/NotMet verdict
    pub verdict: CriterionVerdict,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who ran the evaluation)
    pub author: String,
}

impl Entity for Evaluation {
    const PREFIX: &'static str = "EVAL";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.criterion_title
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Draft => "draft",
            Status::Review => "review",
            Status::Approved => "approved",
            Status::Released => "released",
            Status::Obsolete => "obsolete",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

/// Verdict rule, pure and total over well-formed inputs.
///
/// Attribute: met when the achieved confidence reaches the target
/// confidence at the target reliability (the canonical direction; the
/// Clopper-Pearson reliability bound is carried in the result for
/// display and agrees by construction). Variable: met when the tolerance
/// bound(s) satisfy the specification limit(s). A degenerate point
/// interval compares the mean itself against the limits.
pub fn evaluate_criterion(
    criterion: &AcceptanceCriterion,
    outcome: &AnalysisOutcome,
) -> CriterionVerdict {
    let met = match outcome {
        AnalysisOutcome::Attribute(att) => att.achieved_confidence >= criterion.confidence,
        AnalysisOutcome::Variable(var) => {
            let limits = criterion.limits.unwrap_or_default();
            let lower_ok = matches!(
                (var.lower_bound, limits.lower),
                (Some(bound), Some(lsl)) if bound >= lsl
            );
            let upper_ok = matches!(
                (var.upper_bound, limits.upper),
                (Some(bound), Some(usl)) if bound <= usl
            );
            match criterion.sidedness.unwrap_or(Sidedness::TwoSided) {
                Sidedness::Lower => lower_ok,
                Sidedness::Upper => upper_ok,
                Sidedness::TwoSided => lower_ok && upper_ok,
            }
        }
    };
    if met {
        CriterionVerdict::Met
    } else {
        CriterionVerdict::NotMet
    }
}

/// Articles in scope for a criterion: tagged with one of its requirement
/// IDs, or untagged (untagged articles count toward every criterion).
fn select_articles<'a>(
    criterion: &AcceptanceCriterion,
    articles: &'a [TestArticle],
) -> Vec<&'a TestArticle> {
    articles
        .iter()
        .filter(|a| {
            a.requirements.is_empty()
                || criterion.requirements.is_empty()
                || a.requirements
                    .iter()
                    .any(|r| criterion.requirements.contains(r))
        })
        .collect()
}

/// Measured values feeding a variable criterion: units in the actual
/// sample, excluding failures that carry no measurement (defective by
/// definition). A passing unit without a measurement is a data error.
fn measured_values(
    criterion: &AcceptanceCriterion,
    selected: &[&TestArticle],
) -> Result<Vec<f64>, AnalysisError> {
    let mut values = Vec::new();
    for article in selected {
        match article.outcome {
            Outcome::Pass => match article.measured {
                Some(v) => values.push(v),
                None => {
                    return Err(AnalysisError::invalid(format!(
                        "criterion '{}': article {} passed but has no measured value",
                        criterion.title, article.serial
                    )))
                }
            },
            Outcome::Fail => {
                if let Some(v) = article.measured {
                    values.push(v);
                }
            }
            Outcome::LossReplaced | Outcome::LossNotReplaced => {}
        }
    }
    Ok(values)
}

/// Run a single criterion against a set of test articles.
pub fn run_criterion(
    criterion: &AcceptanceCriterion,
    articles: &[TestArticle],
    policy: DegeneracyPolicy,
    author: &str,
) -> Result<Evaluation, AnalysisError> {
    criterion.validate()?;

    let selected = select_articles(criterion, articles);
    let owned: Vec<TestArticle> = selected.iter().map(|a| (*a).clone()).collect();
    let summary = SampleSummary::from_articles(&owned)?;

    let outcome = match criterion.analysis {
        AnalysisType::Attribute => AnalysisOutcome::Attribute(attribute::analyze(
            summary.actual_sample_size,
            summary.defective_count,
            criterion.reliability,
            criterion.confidence,
        )?),
        AnalysisType::Variable => {
            let values = measured_values(criterion, &selected)?;
            // validate() guarantees sidedness is present for variable criteria
            let sidedness = criterion.sidedness.unwrap_or(Sidedness::TwoSided);
            AnalysisOutcome::Variable(tolerance::interval(
                &values,
                criterion.reliability,
                criterion.confidence,
                sidedness,
                criterion.limits.as_ref(),
                policy,
            )?)
        }
    };

    let verdict = evaluate_criterion(criterion, &outcome);

    Ok(Evaluation {
        id: EntityId::new(EntityPrefix::Eval),
        criterion: criterion.id.clone(),
        criterion_title: criterion.title.clone(),
        requirements: criterion.requirements.clone(),
        summary,
        outcome,
        verdict,
        status: Status::default(),
        created: Utc::now(),
        author: author.to_string(),
    })
}

/// One line of a report: a criterion's evaluation, or its error marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Criterion this entry belongs to
    pub criterion: EntityId,

    /// Criterion description
    pub title: String,

    /// Requirement IDs the criterion verifies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,

    /// The evaluation, when it succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,

    /// The error marker, when it did not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluate every criterion independently; one bad criterion never
/// aborts the rest of the report.
pub fn evaluate_report(
    criteria: &[AcceptanceCriterion],
    articles: &[TestArticle],
    policy: DegeneracyPolicy,
    author: &str,
) -> Vec<ReportEntry> {
    criteria
        .iter()
        .map(|criterion| match run_criterion(criterion, articles, policy, author) {
            Ok(evaluation) => ReportEntry {
                criterion: criterion.id.clone(),
                title: criterion.title.clone(),
                requirements: criterion.requirements.clone(),
                evaluation: Some(evaluation),
                error: None,
            },
            Err(e) => ReportEntry {
                criterion: criterion.id.clone(),
                title: criterion.title.clone(),
                requirements: criterion.requirements.clone(),
                evaluation: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tolerance::SpecLimits;

    fn pass_articles(count: usize) -> Vec<TestArticle> {
        (0..count)
            .map(|i| TestArticle::new(format!("SN{:03}", i), Outcome::Pass))
            .collect()
    }

    /// Ten measured articles: five at 2.44, five at 2.56 (mean 2.5)
    fn measured_articles() -> Vec<TestArticle> {
        (0..10)
            .map(|i| {
                let value = if i % 2 == 0 { 2.44 } else { 2.56 };
                TestArticle::new(format!("SN{:03}", i), Outcome::Pass).with_measured(value)
            })
            .collect()
    }

    #[test]
    fn test_attribute_criterion_met() {
        // 30 passes, zero failures: C = 1 - 0.9^30 = 0.958 >= 0.90
        let crit = AcceptanceCriterion::attribute("Zero failure", 0.90, 0.90, "qe");
        let eval =
            run_criterion(&crit, &pass_articles(30), DegeneracyPolicy::Flag, "qe").unwrap();
        assert_eq!(eval.verdict, CriterionVerdict::Met);
        assert_eq!(eval.summary.actual_sample_size, 30);
        match &eval.outcome {
            AnalysisOutcome::Attribute(att) => {
                assert!((att.achieved_confidence - (1.0 - 0.9_f64.powi(30))).abs() < 1e-9);
            }
            _ => panic!("expected attribute outcome"),
        }
    }

    #[test]
    fn test_attribute_criterion_not_met() {
        // 30 passes at 99% reliability: C = 1 - 0.99^30 = 0.26 < 0.90
        let crit = AcceptanceCriterion::attribute("High reliability", 0.90, 0.99, "qe");
        let eval =
            run_criterion(&crit, &pass_articles(30), DegeneracyPolicy::Flag, "qe").unwrap();
        assert_eq!(eval.verdict, CriterionVerdict::NotMet);
    }

    #[test]
    fn test_variable_criterion_met() {
        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::Lower,
            SpecLimits {
                lower: Some(2.0),
                upper: None,
            },
            "qe",
        );
        let eval =
            run_criterion(&crit, &measured_articles(), DegeneracyPolicy::Flag, "qe").unwrap();
        assert_eq!(eval.verdict, CriterionVerdict::Met);
        match &eval.outcome {
            AnalysisOutcome::Variable(var) => {
                assert_eq!(var.sample_size, 10);
                assert!((var.mean - 2.5).abs() < 1e-12);
                assert!(var.lower_bound.unwrap() > 2.0);
                assert!(var.achieved_confidence.is_some());
            }
            _ => panic!("expected variable outcome"),
        }
    }

    #[test]
    fn test_variable_criterion_not_met() {
        // Lower bound lands near 2.34; an LSL of 2.4 is not demonstrated
        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::Lower,
            SpecLimits {
                lower: Some(2.4),
                upper: None,
            },
            "qe",
        );
        let eval =
            run_criterion(&crit, &measured_articles(), DegeneracyPolicy::Flag, "qe").unwrap();
        assert_eq!(eval.verdict, CriterionVerdict::NotMet);
    }

    #[test]
    fn test_requirement_filtering() {
        let mut articles = vec![
            TestArticle::new("SN001", Outcome::Pass).with_requirement("REQ-001"),
            TestArticle::new("SN002", Outcome::Fail).with_requirement("REQ-002"),
        ];
        // Untagged article counts toward every criterion
        articles.push(TestArticle::new("SN003", Outcome::Pass));

        let crit =
            AcceptanceCriterion::attribute("Req 1 only", 0.90, 0.90, "qe").with_requirement("REQ-001");
        let eval = run_criterion(&crit, &articles, DegeneracyPolicy::Flag, "qe").unwrap();
        // SN002 is out of scope: 2 articles, no defects
        assert_eq!(eval.summary.initial_sample_size, 2);
        assert_eq!(eval.summary.defective_count, 0);
    }

    #[test]
    fn test_failed_article_without_measurement_tolerated() {
        let mut articles = measured_articles();
        articles.push(TestArticle::new("SN999", Outcome::Fail));

        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::Lower,
            SpecLimits {
                lower: Some(2.0),
                upper: None,
            },
            "qe",
        );
        let eval = run_criterion(&crit, &articles, DegeneracyPolicy::Flag, "qe").unwrap();
        // The defective unit is accounted but contributes no value
        assert_eq!(eval.summary.defective_count, 1);
        match &eval.outcome {
            AnalysisOutcome::Variable(var) => assert_eq!(var.sample_size, 10),
            _ => panic!("expected variable outcome"),
        }
    }

    #[test]
    fn test_passing_article_without_measurement_rejected() {
        let mut articles = measured_articles();
        articles.push(TestArticle::new("SN999", Outcome::Pass));

        let crit = AcceptanceCriterion::variable(
            "Pull force",
            0.90,
            0.95,
            Sidedness::Lower,
            SpecLimits {
                lower: Some(2.0),
                upper: None,
            },
            "qe",
        );
        let err = run_criterion(&crit, &articles, DegeneracyPolicy::Flag, "qe");
        assert!(matches!(err, Err(AnalysisError::InvalidInput { .. })));
    }

    #[test]
    fn test_report_collects_partial_results() {
        let mut bad = AcceptanceCriterion::attribute("Broken", 0.90, 0.90, "qe");
        bad.confidence = 1.5;
        let good = AcceptanceCriterion::attribute("Fine", 0.90, 0.90, "qe");

        let entries = evaluate_report(
            &[bad, good],
            &pass_articles(30),
            DegeneracyPolicy::Flag,
            "qe",
        );
        assert_eq!(entries.len(), 2);
        assert!(entries[0].evaluation.is_none());
        assert!(entries[0].error.as_deref().unwrap().contains("confidence"));
        assert!(entries[1].evaluation.is_some());
        assert!(entries[1].error.is_none());
    }

    #[test]
    fn test_degenerate_variable_verdict_uses_point_interval() {
        let articles: Vec<TestArticle> = (0..5)
            .map(|i| TestArticle::new(format!("SN{:03}", i), Outcome::Pass).with_measured(3.0))
            .collect();
        let crit = AcceptanceCriterion::variable(
            "Constant",
            0.90,
            0.95,
            Sidedness::TwoSided,
            SpecLimits {
                lower: Some(2.0),
                upper: Some(4.0),
            },
            "qe",
        );
        let eval = run_criterion(&crit, &articles, DegeneracyPolicy::Flag, "qe").unwrap();
        // Point interval at 3.0 sits inside [2, 4]
        assert_eq!(eval.verdict, CriterionVerdict::Met);
        match &eval.outcome {
            AnalysisOutcome::Variable(var) => assert!(var.degenerate),
            _ => panic!("expected variable outcome"),
        }
    }

    #[test]
    fn test_evaluation_roundtrip() {
        let crit = AcceptanceCriterion::attribute("Zero failure", 0.90, 0.90, "qe");
        let eval =
            run_criterion(&crit, &pass_articles(30), DegeneracyPolicy::Flag, "qe").unwrap();

        let yaml = serde_yml::to_string(&eval).unwrap();
        let parsed: Evaluation = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, eval.id);
        assert_eq!(parsed.verdict, eval.verdict);
        assert_eq!(parsed.summary, eval.summary);
    }

    #[test]
    fn test_entity_trait_implementation() {
        let crit = AcceptanceCriterion::attribute("Zero failure", 0.90, 0.90, "qe");
        let eval =
            run_criterion(&crit, &pass_articles(30), DegeneracyPolicy::Flag, "qe").unwrap();
        assert!(eval.id().to_string().starts_with("EVAL-"));
        assert_eq!(eval.title(), "Zero failure");
        assert_eq!(eval.status(), "draft");
        assert_eq!(Evaluation::PREFIX, "EVAL");
    }
}
