// 📋 Budget Table Normalizer - Raw budget records → period-indexed hours
//
// Only columns whose header matches the period grammar enter the
// reconciliation matrix. Auxiliary columns (coefficient, monthly budget,
// xselling, hourly rate, category...) are excluded from the matrix but kept
// on the normalized record for external collaborators like the Category Gate.
//
// Mixed-type cells never propagate as NaN: a cell that fails numeric parsing
// counts as zero and is reported as a warning.

use crate::actuals::HoursTable;
use crate::import::{RawBudgetRecord, CATEGORY_HEADERS};
use crate::period::Period;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    /// No column header matched the period grammar; reconciliation cannot
    /// proceed against an empty period set.
    #[error("budget table has no valid period columns (expected headers like \"2025-03 (1-15)\" or \"2025-03 (1-fine)\")")]
    NoValidPeriodColumns,
}

// ============================================================================
// WARNINGS
// ============================================================================

/// A budget cell that failed numeric parsing and was counted as zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWarning {
    pub client: String,
    pub period: Period,
    pub raw: String,
}

impl CellWarning {
    pub fn message(&self) -> String {
        format!(
            "non-numeric budget cell for {} / {}: {:?} counted as 0",
            self.client,
            self.period.label(),
            self.raw
        )
    }
}

// ============================================================================
// NORMALIZED BUDGET
// ============================================================================

/// Budget table after normalization.
///
/// `hours` holds only period-matched columns; `extras` keeps every other
/// column per client (numbers as JSON numbers, everything else as strings);
/// `categories` holds the raw non-empty values of a categoria/category
/// column when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBudget {
    pub hours: HoursTable,
    pub extras: BTreeMap<String, BTreeMap<String, Value>>,
    pub categories: BTreeMap<String, String>,
    pub warnings: Vec<CellWarning>,
}

impl NormalizedBudget {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Parse a budget cell. Comma decimal separators accepted; negatives kept
/// as provided (malformed input is still input).
fn parse_budget_cell(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Normalize raw budget records into a period-indexed hours table.
///
/// Fails with `NoValidPeriodColumns` when not a single column header matches
/// the period grammar. Duplicate client rows are summed per cell.
pub fn normalize(records: &[RawBudgetRecord]) -> Result<NormalizedBudget, BudgetError> {
    let mut out = NormalizedBudget::default();
    let mut saw_period_column = false;

    for record in records {
        for (header, raw) in &record.cells {
            match Period::parse_label(header) {
                Some(period) => {
                    saw_period_column = true;
                    let trimmed = raw.trim();
                    let hours = if trimmed.is_empty() {
                        // Absent cell: plain zero, not a mixed-type warning
                        0.0
                    } else {
                        match parse_budget_cell(trimmed) {
                            Some(h) => h,
                            None => {
                                out.warnings.push(CellWarning {
                                    client: record.client.clone(),
                                    period,
                                    raw: raw.clone(),
                                });
                                0.0
                            }
                        }
                    };
                    out.hours.add(&record.client, period, hours);
                }
                None => {
                    let value = match parse_budget_cell(raw) {
                        Some(n) => serde_json::json!(n),
                        None => Value::String(raw.clone()),
                    };
                    out.extras
                        .entry(record.client.clone())
                        .or_default()
                        .insert(header.clone(), value);

                    let is_category = CATEGORY_HEADERS
                        .iter()
                        .any(|n| header.eq_ignore_ascii_case(n));
                    if is_category && !raw.trim().is_empty() {
                        out.categories
                            .insert(record.client.clone(), raw.trim().to_string());
                    }
                }
            }
        }
    }

    if !saw_period_column {
        return Err(BudgetError::NoValidPeriodColumns);
    }

    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================
