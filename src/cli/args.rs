//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    attribute::AttributeArgs,
    completions::CompletionsArgs,
    eval::EvalArgs,
    interval::IntervalArgs,
    summary::SummaryArgs,
};

#[derive(Parser)]
#[command(name = "vrt")]
#[command(author, version, about = "Verity Reliability Toolkit")]
#[command(long_about = "A CLI for sample accounting and confidence/reliability analysis of design verification test data.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample accounting over a test-article file
    Summary(SummaryArgs),

    /// Attribute (pass/fail) confidence/reliability analysis
    Attribute(AttributeArgs),

    /// Normal tolerance interval over measured values
    Interval(IntervalArgs),

    /// Evaluate acceptance criteria against test articles
    Eval(EvalArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (tables and styled text)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
}
