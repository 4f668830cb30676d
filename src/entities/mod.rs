//! Entity types - the engine's data model

pub mod article;
pub mod criterion;
pub mod evaluation;

pub use article::{Outcome, SampleSummary, TestArticle};
pub use criterion::{AcceptanceCriterion, AnalysisType};
pub use evaluation::{
    evaluate_criterion, evaluate_report, run_criterion, AnalysisOutcome, CriterionVerdict,
    Evaluation, ReportEntry,
};
