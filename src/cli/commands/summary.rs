//! `vrt summary` command - sample accounting over a test-article file

use console::style;
use miette::{miette, Result};
use std::path::PathBuf;

use crate::cli::helpers::escape_csv;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::article::SampleSummary;

use super::{print_structured, read_articles};

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Test-article CSV file (serial, outcome, optional lot/value/requirements)
    #[arg(long, short = 'a')]
    pub articles: PathBuf,

    /// Restrict to articles tagged with this requirement ID
    #[arg(long, short = 'r')]
    pub requirement: Option<String>,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let mut articles = read_articles(&args.articles)?;
    if let Some(req) = &args.requirement {
        articles.retain(|a| a.requirements.is_empty() || a.requirements.contains(req));
    }

    let summary = SampleSummary::from_articles(&articles).map_err(|e| miette!("{}", e))?;

    match global.format {
        OutputFormat::Auto => print_human(&summary, global),
        OutputFormat::Yaml | OutputFormat::Json => print_structured(&summary, global.format)?,
        OutputFormat::Csv => print_csv(&summary),
    }

    Ok(())
}

fn print_human(summary: &SampleSummary, global: &GlobalOpts) {
    println!("Initial sample size:   {}", summary.initial_sample_size);
    println!(
        "Test method losses:    {} ({} replaced, {} not replaced)",
        summary.loss_count(),
        summary.losses_replaced,
        summary.losses_not_replaced
    );
    println!("Actual sample size:    {}", summary.actual_sample_size);
    println!("Passed:                {}", summary.pass_count);

    let defects = if summary.defective_count > 0 {
        style(summary.defective_count.to_string()).red().to_string()
    } else {
        style("0").green().to_string()
    };
    println!("Defective units:       {}", defects);

    if !global.quiet && !summary.defective_serials.is_empty() {
        println!(
            "Defective serials:     {}",
            summary.defective_serials.join(", ")
        );
    }
    if !global.quiet {
        println!("Pass rate:             {:.2}%", summary.pass_rate());
    }
}

fn print_csv(summary: &SampleSummary) {
    println!(
        "initial_sample_size,losses_replaced,losses_not_replaced,actual_sample_size,pass_count,defective_count,defective_serials"
    );
    println!(
        "{},{},{},{},{},{},{}",
        summary.initial_sample_size,
        summary.losses_replaced,
        summary.losses_not_replaced,
        summary.actual_sample_size,
        summary.pass_count,
        summary.defective_count,
        escape_csv(&summary.defective_serials.join(";"))
    );
}
