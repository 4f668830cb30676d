//! `vrt interval` command - normal tolerance interval over measured values

use clap::ValueEnum;
use console::style;
use miette::{miette, Result};
use std::path::PathBuf;

use crate::cli::helpers::{fmt_pct, fmt_value};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::stats::tolerance::{self, DegeneracyPolicy, Sidedness, SpecLimits, VariableResult};

use super::{print_structured, read_values};

/// Bound direction flag
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SidedArg {
    /// One-sided lower bound
    Lower,
    /// One-sided upper bound
    Upper,
    /// Two-sided interval
    Two,
}

impl From<SidedArg> for Sidedness {
    fn from(value: SidedArg) -> Self {
        match value {
            SidedArg::Lower => Sidedness::Lower,
            SidedArg::Upper => Sidedness::Upper,
            SidedArg::Two => Sidedness::TwoSided,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct IntervalArgs {
    /// CSV file holding the measured values
    #[arg(long, short = 'i')]
    pub values: PathBuf,

    /// Column to read the values from
    #[arg(long, default_value = "value")]
    pub column: String,

    /// Population proportion the interval must cover, in (0, 1)
    #[arg(long, short = 'p')]
    pub proportion: f64,

    /// Confidence level, in (0, 1)
    #[arg(long, short = 'c')]
    pub confidence: f64,

    /// Bound direction
    #[arg(long, short = 's', value_enum, default_value = "lower")]
    pub sided: SidedArg,

    /// Lower specification limit, for achieved-confidence reporting
    #[arg(long)]
    pub lsl: Option<f64>,

    /// Upper specification limit, for achieved-confidence reporting
    #[arg(long)]
    pub usl: Option<f64>,

    /// Fail on a constant (zero standard deviation) sample instead of
    /// reporting a point interval
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: IntervalArgs, global: &GlobalOpts) -> Result<()> {
    let values = read_values(&args.values, &args.column)?;

    let limits = if args.lsl.is_some() || args.usl.is_some() {
        Some(SpecLimits {
            lower: args.lsl,
            upper: args.usl,
        })
    } else {
        None
    };
    let policy = if args.strict {
        DegeneracyPolicy::Strict
    } else {
        DegeneracyPolicy::Flag
    };

    let result = tolerance::interval(
        &values,
        args.proportion,
        args.confidence,
        args.sided.into(),
        limits.as_ref(),
        policy,
    )
    .map_err(|e| miette!("{}", e))?;

    match global.format {
        OutputFormat::Auto => print_human(&result, global),
        OutputFormat::Yaml | OutputFormat::Json => print_structured(&result, global.format)?,
        OutputFormat::Csv => print_csv(&result),
    }

    Ok(())
}

fn print_human(result: &VariableResult, global: &GlobalOpts) {
    println!("Sample size:           {}", result.sample_size);
    println!("Mean:                  {}", fmt_value(result.mean));
    println!("Std deviation:         {}", fmt_value(result.std_dev));
    println!(
        "Target:                {} confidence / {} of population",
        fmt_pct(result.confidence),
        fmt_pct(result.proportion)
    );
    println!("Tolerance factor k:    {:.4}", result.k_factor);

    if result.degenerate {
        println!(
            "{}",
            style("Constant sample: interval collapsed to a point at the mean").yellow()
        );
    }
    if let Some(lower) = result.lower_bound {
        println!("Lower bound:           {}", fmt_value(lower));
    }
    if let Some(upper) = result.upper_bound {
        println!("Upper bound:           {}", fmt_value(upper));
    }
    if let Some(achieved) = result.achieved_confidence {
        println!("Achieved confidence:   {}", fmt_pct(achieved));
    }

    if !global.quiet {
        let s = &result.summary;
        println!(
            "Five-number summary:   min {} | q1 {} | median {} | q3 {} | max {}",
            fmt_value(s.min),
            fmt_value(s.q1),
            fmt_value(s.median),
            fmt_value(s.q3),
            fmt_value(s.max)
        );
    }
}

fn print_csv(result: &VariableResult) {
    println!(
        "sample_size,mean,std_dev,proportion,confidence,k_factor,lower_bound,upper_bound,degenerate,achieved_confidence"
    );
    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    println!(
        "{},{},{},{},{},{},{},{},{},{}",
        result.sample_size,
        result.mean,
        result.std_dev,
        result.proportion,
        result.confidence,
        result.k_factor,
        opt(result.lower_bound),
        opt(result.upper_bound),
        result.degenerate,
        opt(result.achieved_confidence)
    );
}
