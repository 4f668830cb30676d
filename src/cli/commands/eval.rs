//! `vrt eval` command - evaluate acceptance criteria against test articles
//!
//! Each criterion is evaluated independently; a criterion that cannot be
//! computed shows its error marker in the report without aborting the
//! others.

use console::style;
use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, fmt_pct, fmt_value, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::evaluation::{
    evaluate_report, AnalysisOutcome, CriterionVerdict, ReportEntry,
};
use crate::stats::tolerance::DegeneracyPolicy;

use super::{print_structured, read_articles, read_criteria};

#[derive(clap::Args, Debug)]
pub struct EvalArgs {
    /// Test-article CSV file
    #[arg(long, short = 'a')]
    pub articles: PathBuf,

    /// Acceptance-criteria YAML file
    #[arg(long, short = 'c')]
    pub criteria: PathBuf,

    /// Fail criteria with constant samples instead of reporting a point
    /// interval
    #[arg(long)]
    pub strict: bool,

    /// Author recorded on the evaluation records
    #[arg(long, default_value = "vrt")]
    pub author: String,
}

pub fn run(args: EvalArgs, global: &GlobalOpts) -> Result<()> {
    let articles = read_articles(&args.articles)?;
    let criteria = read_criteria(&args.criteria)?;

    let policy = if args.strict {
        DegeneracyPolicy::Strict
    } else {
        DegeneracyPolicy::Flag
    };
    let entries = evaluate_report(&criteria, &articles, policy, &args.author);

    match global.format {
        OutputFormat::Auto => print_table(&entries, global),
        OutputFormat::Yaml | OutputFormat::Json => print_structured(&entries, global.format)?,
        OutputFormat::Csv => print_csv(&entries),
    }

    Ok(())
}

/// Short display form of the statistical result
fn result_cell(entry: &ReportEntry) -> String {
    match &entry.evaluation {
        Some(eval) => match &eval.outcome {
            AnalysisOutcome::Attribute(att) => {
                format!(
                    "C {} / bound {}",
                    fmt_pct(att.achieved_confidence),
                    fmt_pct(att.reliability_bound)
                )
            }
            AnalysisOutcome::Variable(var) => {
                let bounds = match (var.lower_bound, var.upper_bound) {
                    (Some(l), Some(u)) => format!("[{}, {}]", fmt_value(l), fmt_value(u)),
                    (Some(l), None) => format!(">= {}", fmt_value(l)),
                    (None, Some(u)) => format!("<= {}", fmt_value(u)),
                    (None, None) => "-".to_string(),
                };
                if var.degenerate {
                    format!("{} (point)", bounds)
                } else {
                    bounds
                }
            }
        },
        None => "-".to_string(),
    }
}

fn verdict_cell(entry: &ReportEntry) -> String {
    match &entry.evaluation {
        Some(eval) => match eval.verdict {
            CriterionVerdict::Met => style("MET").green().to_string(),
            CriterionVerdict::NotMet => style("NOT MET").red().to_string(),
        },
        None => style("ERROR").yellow().to_string(),
    }
}

fn print_table(entries: &[ReportEntry], global: &GlobalOpts) {
    let mut builder = Builder::default();
    builder.push_record(["CRITERION", "REQS", "N", "DEF", "TARGET", "RESULT", "VERDICT"]);

    for entry in entries {
        let (n, def, target) = match &entry.evaluation {
            Some(eval) => {
                let (confidence, reliability) = match &eval.outcome {
                    AnalysisOutcome::Attribute(att) => {
                        (att.target_confidence, att.target_reliability)
                    }
                    AnalysisOutcome::Variable(var) => (var.confidence, var.proportion),
                };
                (
                    eval.summary.actual_sample_size.to_string(),
                    eval.summary.defective_count.to_string(),
                    format!("{}/{}", fmt_pct(confidence), fmt_pct(reliability)),
                )
            }
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };

        builder.push_record([
            truncate_str(&entry.title, 32),
            entry.requirements.join(", "),
            n,
            def,
            target,
            result_cell(entry),
            verdict_cell(entry),
        ]);
    }

    println!("{}", builder.build().with(Style::markdown()));

    for entry in entries {
        if let Some(error) = &entry.error {
            eprintln!(
                "{} {}: {}",
                style("✗").red(),
                truncate_str(&entry.title, 32),
                error
            );
        }
    }

    if !global.quiet {
        let met = entries
            .iter()
            .filter(|e| {
                matches!(
                    e.evaluation.as_ref().map(|ev| ev.verdict),
                    Some(CriterionVerdict::Met)
                )
            })
            .count();
        let errors = entries.iter().filter(|e| e.error.is_some()).count();
        let not_met = entries.len() - met - errors;
        println!(
            "\n{} criteria: {} met, {} not met, {} error(s)",
            entries.len(),
            met,
            not_met,
            errors
        );
    }
}

fn print_csv(entries: &[ReportEntry]) {
    println!("criterion,title,requirements,actual_sample_size,defective_count,verdict,error");
    for entry in entries {
        let (n, def, verdict) = match &entry.evaluation {
            Some(eval) => (
                eval.summary.actual_sample_size.to_string(),
                eval.summary.defective_count.to_string(),
                eval.verdict.to_string(),
            ),
            None => (String::new(), String::new(), "error".to_string()),
        };
        println!(
            "{},{},{},{},{},{},{}",
            entry.criterion,
            escape_csv(&entry.title),
            escape_csv(&entry.requirements.join(";")),
            n,
            def,
            verdict,
            escape_csv(entry.error.as_deref().unwrap_or(""))
        );
    }
}
