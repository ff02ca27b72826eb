// 📥 Report Export - One CSV per granularity, tags kept distinct
//
// The "workbook" is a report directory with one file per granularity
// (detail.csv, month.csv, quarter.csv, total.csv). Each row carries the raw
// hour sums plus the classification as a PAIR of columns: a tag string
// (esito) and a numeric percentage (scostamento_pct) that is filled only on
// percentage rows. The tag is never folded into a numeric sentinel like
// -9999 - that encoding is exactly what this pipeline exists to retire.
//
// Exported files re-parse losslessly: same tags, same one-decimal numbers.

use crate::classify::VarianceOutcome;
use crate::rollup::{Grouping, RollupRow, VarianceReport};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// WIRE FORMAT
// ============================================================================

pub const TAG_PERCENTAGE: &str = "percentuale";
pub const TAG_EXTRABUDGET: &str = "extrabudget";
pub const TAG_UNDEFINED: &str = "non definito";

/// One CSV row. Headers match the original report's Italian column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReportRow {
    #[serde(rename = "cliente")]
    client: String,

    #[serde(rename = "periodo")]
    period: String,

    #[serde(rename = "budget_ore")]
    budget_hours: f64,

    #[serde(rename = "ore_effettive")]
    actual_hours: f64,

    #[serde(rename = "esito")]
    tag: String,

    /// One decimal; empty for extrabudget/undefined rows
    #[serde(rename = "scostamento_pct")]
    percentage: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReportParseError {
    #[error("unknown esito tag {tag:?} on line {line}")]
    UnknownTag { tag: String, line: usize },

    #[error("percentage row without a numeric scostamento_pct on line {line}")]
    MissingPercentage { line: usize },

    #[error("non-percentage row carries scostamento_pct {value:?} on line {line}")]
    UnexpectedPercentage { value: String, line: usize },
}

fn encode_outcome(outcome: VarianceOutcome) -> (String, String) {
    match outcome {
        VarianceOutcome::Percentage(p) => (TAG_PERCENTAGE.to_string(), format!("{:.1}", p)),
        VarianceOutcome::Extrabudget => (TAG_EXTRABUDGET.to_string(), String::new()),
        VarianceOutcome::Undefined => (TAG_UNDEFINED.to_string(), String::new()),
    }
}

fn decode_outcome(tag: &str, percentage: &str, line: usize) -> Result<VarianceOutcome, ReportParseError> {
    match tag {
        TAG_PERCENTAGE => {
            let p: f64 = percentage.trim().parse().map_err(|_| {
                ReportParseError::MissingPercentage { line }
            })?;
            Ok(VarianceOutcome::Percentage(p))
        }
        TAG_EXTRABUDGET | TAG_UNDEFINED => {
            if !percentage.trim().is_empty() {
                return Err(ReportParseError::UnexpectedPercentage {
                    value: percentage.to_string(),
                    line,
                });
            }
            Ok(if tag == TAG_EXTRABUDGET {
                VarianceOutcome::Extrabudget
            } else {
                VarianceOutcome::Undefined
            })
        }
        _ => Err(ReportParseError::UnknownTag {
            tag: tag.to_string(),
            line,
        }),
    }
}

// ============================================================================
// WRITING
// ============================================================================

fn sheet_path(dir: &Path, grouping: Grouping) -> PathBuf {
    dir.join(format!("{}.csv", grouping.name()))
}

fn write_sheet(path: &Path, rows: &[RollupRow]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;

    for row in rows {
        let (tag, percentage) = encode_outcome(row.outcome);
        writer.serialize(ReportRow {
            client: row.client.clone(),
            period: row.key.label(),
            budget_hours: row.budget_hours,
            actual_hours: row.actual_hours,
            tag,
            percentage,
        })?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush report file: {}", path.display()))?;
    Ok(())
}

/// Write the full report to a directory: detail.csv, month.csv, quarter.csv,
/// total.csv. The directory is created if absent.
pub fn write_report(dir: &Path, report: &VarianceReport) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;

    for grouping in [
        Grouping::SinglePeriod,
        Grouping::Month,
        Grouping::Quarter,
        Grouping::Total,
    ] {
        write_sheet(&sheet_path(dir, grouping), report.rows_for(grouping))?;
    }

    Ok(())
}

// ============================================================================
// READING (round-trip)
// ============================================================================

/// A re-parsed report row. The grouping key comes back as its label; the
/// three-way outcome and the one-decimal percentage are recovered exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReportRow {
    pub client: String,
    pub period_label: String,
    pub budget_hours: f64,
    pub actual_hours: f64,
    pub outcome: VarianceOutcome,
}

/// Re-parse one exported sheet
pub fn read_report_file(path: &Path) -> Result<Vec<ParsedReportRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open report file: {}", path.display()))?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.deserialize::<ReportRow>().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse report line {} in {}", line_num + 2, path.display())
        })?;
        let outcome = decode_outcome(&row.tag, &row.percentage, line_num + 2)
            .with_context(|| format!("Invalid outcome in {}", path.display()))?;

        rows.push(ParsedReportRow {
            client: row.client,
            period_label: row.period,
            budget_hours: row.budget_hours,
            actual_hours: row.actual_hours,
            outcome,
        });
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
