//! Command implementations

pub mod attribute;
pub mod completions;
pub mod eval;
pub mod interval;
pub mod summary;

use csv::{ReaderBuilder, StringRecord};
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::entities::article::{Outcome, TestArticle};
use crate::entities::criterion::AcceptanceCriterion;

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

pub(crate) fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First non-empty value among aliased column names
fn get_aliased(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    names: &[&str],
) -> Option<String> {
    names.iter().find_map(|n| get_field(record, header_map, n))
}

/// Read test articles from a CSV file.
///
/// Required columns: serial (or serial_number) and outcome (or result).
/// Optional: lot (lot_number), value (measured), requirements
/// (semicolon-separated requirement IDs).
pub(crate) fn read_articles(path: &Path) -> Result<Vec<TestArticle>> {
    let file = File::open(path)
        .map_err(|e| miette!("Cannot open articles file {}: {}", path.display(), e))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let header_map = build_header_map(&headers);

    let mut articles = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row_num = row_idx + 2; // 1-indexed plus header row
        let record = result
            .map_err(|e| miette!("CSV parse error at row {}: {}", row_num, e))?;

        let serial = get_aliased(&record, &header_map, &["serial", "serial_number"])
            .ok_or_else(|| miette!("Missing required field 'serial' at row {}", row_num))?;

        let outcome_str = get_aliased(&record, &header_map, &["outcome", "result"])
            .ok_or_else(|| miette!("Missing required field 'outcome' at row {}", row_num))?;
        let outcome: Outcome = outcome_str
            .parse()
            .map_err(|e| miette!("Row {}: {}", row_num, e))?;

        let lot = get_aliased(&record, &header_map, &["lot", "lot_number"]);

        let measured = match get_aliased(&record, &header_map, &["value", "measured"]) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                miette!("Row {}: measured value '{}' is not a number", row_num, raw)
            })?),
            None => None,
        };

        let requirements = get_aliased(&record, &header_map, &["requirements", "requirement"])
            .map(|raw| {
                raw.split(';')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        articles.push(TestArticle {
            serial,
            lot,
            outcome,
            measured,
            requirements,
        });
    }

    Ok(articles)
}

/// Read a column of measured values from a CSV file.
pub(crate) fn read_values(path: &Path, column: &str) -> Result<Vec<f64>> {
    let file = File::open(path)
        .map_err(|e| miette!("Cannot open values file {}: {}", path.display(), e))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let header_map = build_header_map(&headers);
    let column = column.to_lowercase();
    if !header_map.contains_key(&column) {
        return Err(miette!(
            "Column '{}' not found in {} (columns: {})",
            column,
            path.display(),
            headers.iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let mut values = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row_num = row_idx + 2;
        let record = result
            .map_err(|e| miette!("CSV parse error at row {}: {}", row_num, e))?;
        if let Some(raw) = get_field(&record, &header_map, &column) {
            let value = raw.parse::<f64>().map_err(|_| {
                miette!("Row {}: value '{}' is not a number", row_num, raw)
            })?;
            values.push(value);
        }
    }

    Ok(values)
}

/// Read acceptance criteria from a YAML file (a list of criterion maps).
pub(crate) fn read_criteria(path: &Path) -> Result<Vec<AcceptanceCriterion>> {
    let content = fs::read_to_string(path)
        .map_err(|e| miette!("Cannot read criteria file {}: {}", path.display(), e))?;
    let criteria: Vec<AcceptanceCriterion> = serde_yml::from_str(&content)
        .map_err(|e| miette!("Invalid criteria file {}: {}", path.display(), e))?;
    if criteria.is_empty() {
        return Err(miette!("No criteria found in {}", path.display()));
    }
    Ok(criteria)
}

/// Serialize a value to stdout in the requested structured format.
pub(crate) fn print_structured<T: Serialize>(
    value: &T,
    format: crate::cli::OutputFormat,
) -> Result<()> {
    match format {
        crate::cli::OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
        crate::cli::OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => unreachable!("print_structured only handles yaml and json"),
    }
    Ok(())
}
