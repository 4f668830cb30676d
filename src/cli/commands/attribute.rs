//! `vrt attribute` command - pass/fail confidence/reliability analysis

use console::style;
use miette::{miette, Result};
use std::path::PathBuf;

use crate::cli::helpers::fmt_pct;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::article::SampleSummary;
use crate::stats::attribute::{self, AttributeResult};

use super::{print_structured, read_articles};

#[derive(clap::Args, Debug)]
pub struct AttributeArgs {
    /// Test-article CSV file; sample size and defect count are derived
    /// from its accounting
    #[arg(long, short = 'a', conflicts_with_all = ["sample_size", "defects"])]
    pub articles: Option<PathBuf>,

    /// Restrict articles to this requirement ID
    #[arg(long, requires = "articles")]
    pub requirement: Option<String>,

    /// Actual sample size n
    #[arg(long, short = 'n', requires = "defects")]
    pub sample_size: Option<usize>,

    /// Defective unit count d
    #[arg(long, short = 'd', requires = "sample_size")]
    pub defects: Option<usize>,

    /// Target reliability, in (0, 1)
    #[arg(long, short = 'r')]
    pub reliability: f64,

    /// Target confidence, in (0, 1)
    #[arg(long, short = 'c')]
    pub confidence: f64,
}

pub fn run(args: AttributeArgs, global: &GlobalOpts) -> Result<()> {
    let (n, d) = match (&args.articles, args.sample_size, args.defects) {
        (Some(path), _, _) => {
            let mut articles = read_articles(path)?;
            if let Some(req) = &args.requirement {
                articles.retain(|a| a.requirements.is_empty() || a.requirements.contains(req));
            }
            let summary = SampleSummary::from_articles(&articles).map_err(|e| miette!("{}", e))?;
            (summary.actual_sample_size, summary.defective_count)
        }
        (None, Some(n), Some(d)) => (n, d),
        _ => {
            return Err(miette!(
                "Provide either --articles or both --sample-size and --defects"
            ))
        }
    };

    let result =
        attribute::analyze(n, d, args.reliability, args.confidence).map_err(|e| miette!("{}", e))?;

    match global.format {
        OutputFormat::Auto => print_human(&result, global),
        OutputFormat::Yaml | OutputFormat::Json => print_structured(&result, global.format)?,
        OutputFormat::Csv => print_csv(&result),
    }

    Ok(())
}

fn print_human(result: &AttributeResult, global: &GlobalOpts) {
    println!("Sample size:           {}", result.sample_size);
    println!("Defective units:       {}", result.defective_count);
    println!(
        "Target:                {} confidence / {} reliability",
        fmt_pct(result.target_confidence),
        fmt_pct(result.target_reliability)
    );

    let achieved = fmt_pct(result.achieved_confidence);
    let achieved = if result.achieved_confidence >= result.target_confidence {
        style(achieved).green()
    } else {
        style(achieved).red()
    };
    println!("Achieved confidence:   {}", achieved);
    println!(
        "Reliability bound:     {} at {} confidence",
        fmt_pct(result.reliability_bound),
        fmt_pct(result.target_confidence)
    );

    if global.verbose {
        println!(
            "Defect rate:           {:.4}",
            result.defective_count as f64 / result.sample_size as f64
        );
    }
}

fn print_csv(result: &AttributeResult) {
    println!(
        "sample_size,defective_count,target_reliability,target_confidence,achieved_confidence,reliability_bound"
    );
    println!(
        "{},{},{},{},{},{}",
        result.sample_size,
        result.defective_count,
        result.target_reliability,
        result.target_confidence,
        result.achieved_confidence,
        result.reliability_bound
    );
}
