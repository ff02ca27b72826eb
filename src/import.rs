// 📂 Import - CSV ingestion for actual time entries and raw budget tables
//
// Two inputs, two shapes:
//   - Actuals: one row per logged time entry (cliente, data, ore)
//   - Budget:  one row per client, arbitrary columns (typed later by the
//     budget normalizer - here every cell stays a raw string)
//
// Actual rows that fail to parse are excluded, never fatal, and counted in
// ImportStats so callers can report how much input was dropped.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

// ============================================================================
// TIME ENTRY
// ============================================================================

/// One logged unit of work. Immutable once ingested; every surviving entry
/// has a valid date and hours >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub client: String,
    pub date: NaiveDate,
    pub hours: f64,
}

// ============================================================================
// IMPORT DIAGNOSTICS
// ============================================================================

/// Counts of what happened to the raw rows during import.
/// Skipped rows are recovered locally (excluded), never fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped_bad_date: usize,
    pub skipped_bad_hours: usize,
    pub skipped_negative_hours: usize,
    pub skipped_empty_client: usize,
}

impl ImportStats {
    pub fn skipped(&self) -> usize {
        self.total_rows - self.imported
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} imported, {} skipped ({} bad date, {} bad hours, {} negative, {} no client)",
            self.total_rows,
            self.imported,
            self.skipped(),
            self.skipped_bad_date,
            self.skipped_bad_hours,
            self.skipped_negative_hours,
            self.skipped_empty_client,
        )
    }
}

// ============================================================================
// DATE / HOURS PARSING
// ============================================================================

/// Two-digit years pivot here: 70..=99 → 1900s, 00..=69 → 2000s
pub const PIVOT_YEAR: i32 = 70;

/// Parse a day/month/year date with `/` or `-` separators.
///
/// Accepts two-digit or four-digit years; two-digit years are resolved
/// against PIVOT_YEAR ("31/12/24" → 2024-12-31, "01/01/85" → 1985-01-01).
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let sep = if raw.contains('/') {
        '/'
    } else if raw.contains('-') {
        '-'
    } else {
        return None;
    };

    let mut parts = raw.split(sep);
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year_str = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }

    let year: i32 = match year_str.len() {
        4 => year_str.parse().ok()?,
        2 => {
            let yy: i32 = year_str.parse().ok()?;
            if yy >= PIVOT_YEAR {
                1900 + yy
            } else {
                2000 + yy
            }
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse an hours cell. Comma decimal separators are accepted ("7,5" → 7.5),
/// matching the locale of the original timesheet exports.
pub fn parse_hours(raw: &str) -> Option<f64> {
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

// ============================================================================
// HEADER RESOLUTION
// ============================================================================

/// Find a column index by any of the accepted header names (case-insensitive).
/// The original tool wrote Italian headers; English aliases are accepted too.
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim();
        names.iter().any(|n| h.eq_ignore_ascii_case(n))
    })
}

pub const CLIENT_HEADERS: [&str; 2] = ["cliente", "client"];
pub const DATE_HEADERS: [&str; 2] = ["data", "date"];
pub const HOURS_HEADERS: [&str; 3] = ["ore", "hours", "ore_lavorate"];
pub const CATEGORY_HEADERS: [&str; 2] = ["categoria", "category"];

// ============================================================================
// ACTUALS IMPORT
// ============================================================================

/// Load actual time entries from a CSV file.
///
/// Expected columns: cliente/client, data/date, ore/hours. Rows with an
/// unparseable date, unparseable or negative hours, or an empty client are
/// dropped and counted in ImportStats.
pub fn load_time_entries(path: &Path) -> Result<(Vec<TimeEntry>, ImportStats)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open actuals file: {}", path.display()))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers from {}", path.display()))?
        .clone();

    let client_idx = find_column(&headers, &CLIENT_HEADERS)
        .with_context(|| format!("No client column (cliente) in {}", path.display()))?;
    let date_idx = find_column(&headers, &DATE_HEADERS)
        .with_context(|| format!("No date column (data) in {}", path.display()))?;
    let hours_idx = find_column(&headers, &HOURS_HEADERS)
        .with_context(|| format!("No hours column (ore) in {}", path.display()))?;

    let mut entries = Vec::new();
    let mut stats = ImportStats::default();

    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;
        stats.total_rows += 1;

        let client = record.get(client_idx).unwrap_or("").trim();
        if client.is_empty() {
            stats.skipped_empty_client += 1;
            continue;
        }

        let date = match parse_entry_date(record.get(date_idx).unwrap_or("")) {
            Some(d) => d,
            None => {
                stats.skipped_bad_date += 1;
                continue;
            }
        };

        let hours = match parse_hours(record.get(hours_idx).unwrap_or("")) {
            Some(h) => h,
            None => {
                stats.skipped_bad_hours += 1;
                continue;
            }
        };
        if hours < 0.0 {
            stats.skipped_negative_hours += 1;
            continue;
        }

        entries.push(TimeEntry {
            client: client.to_string(),
            date,
            hours,
        });
        stats.imported += 1;
    }

    Ok((entries, stats))
}

// ============================================================================
// RAW BUDGET IMPORT
// ============================================================================

/// One budget row as it arrived: a client plus every other cell as a raw
/// string, in original column order. Typing happens in the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBudgetRecord {
    pub client: String,
    /// (header, raw cell) pairs, original column order, client column excluded
    pub cells: Vec<(String, String)>,
}

/// Load a raw budget table from a CSV file.
///
/// Requires a cliente/client column; every other column is carried as-is.
/// Rows with an empty client cell are skipped.
pub fn load_raw_budget(path: &Path) -> Result<Vec<RawBudgetRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open budget file: {}", path.display()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers from {}", path.display()))?
        .clone();

    let client_idx = find_column(&headers, &CLIENT_HEADERS)
        .with_context(|| format!("No client column (cliente) in {}", path.display()))?;

    let mut records = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;

        let client = record.get(client_idx).unwrap_or("").trim().to_string();
        if client.is_empty() {
            continue;
        }

        let cells = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != client_idx)
            .map(|(i, header)| {
                (
                    header.trim().to_string(),
                    record.get(i).unwrap_or("").to_string(),
                )
            })
            .collect();

        records.push(RawBudgetRecord { client, cells });
    }

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_entry_date_four_digit_year() {
        assert_eq!(
            parse_entry_date("31/12/2024"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(
            parse_entry_date("1/3/2025"),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(
            parse_entry_date("15-06-2025"),
            NaiveDate::from_ymd_opt(2025, 6, 15)
        );
    }

    #[test]
    fn test_parse_entry_date_pivot_year() {
        // 00..=69 → 2000s
        assert_eq!(
            parse_entry_date("05/04/24"),
            NaiveDate::from_ymd_opt(2024, 4, 5)
        );
        assert_eq!(
            parse_entry_date("01/01/69"),
            NaiveDate::from_ymd_opt(2069, 1, 1)
        );
        // 70..=99 → 1900s
        assert_eq!(
            parse_entry_date("01/01/70"),
            NaiveDate::from_ymd_opt(1970, 1, 1)
        );
        assert_eq!(
            parse_entry_date("25/12/85"),
            NaiveDate::from_ymd_opt(1985, 12, 25)
        );
    }

    #[test]
    fn test_parse_entry_date_rejects_garbage() {
        assert_eq!(parse_entry_date("not-a-date"), None);
        assert_eq!(parse_entry_date("2024-12-31-extra"), None);
        assert_eq!(parse_entry_date("32/01/2024"), None); // day out of range
        assert_eq!(parse_entry_date("15/13/2024"), None); // month out of range
        assert_eq!(parse_entry_date("15/06/202"), None); // three-digit year
        assert_eq!(parse_entry_date(""), None);
    }

    #[test]
    fn test_parse_hours_decimal_comma() {
        assert_eq!(parse_hours("7,5"), Some(7.5));
        assert_eq!(parse_hours("8"), Some(8.0));
        assert_eq!(parse_hours(" 3.25 "), Some(3.25));
        assert_eq!(parse_hours("abc"), None);
        assert_eq!(parse_hours(""), None);
        assert_eq!(parse_hours("NaN"), None);
    }

    fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_time_entries_skips_bad_rows() {
        let csv = "\
cliente,data,ore
Acme,03/03/2025,5
Acme,bad-date,5
Acme,10/03/2025,abc
Acme,12/03/2025,-2
,14/03/2025,3
Beta,20/03/2025,\"7,5\"
";
        let f = write_temp_csv(csv);
        let (entries, stats) = load_time_entries(f.path()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(stats.total_rows, 6);
        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped_bad_date, 1);
        assert_eq!(stats.skipped_bad_hours, 1);
        assert_eq!(stats.skipped_negative_hours, 1);
        assert_eq!(stats.skipped_empty_client, 1);
        assert_eq!(stats.skipped(), 4);

        assert_eq!(entries[0].client, "Acme");
        assert_eq!(entries[0].hours, 5.0);
        assert_eq!(entries[1].client, "Beta");
        assert_eq!(entries[1].hours, 7.5);
    }

    #[test]
    fn test_load_time_entries_english_headers() {
        let f = write_temp_csv("client,date,hours\nAcme,05/02/2025,4\n");
        let (entries, stats) = load_time_entries(f.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(stats.imported, 1);
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
    }

    #[test]
    fn test_load_time_entries_missing_column_is_error() {
        let f = write_temp_csv("cliente,data\nAcme,05/02/2025\n");
        assert!(load_time_entries(f.path()).is_err());
    }

    #[test]
    fn test_load_raw_budget_keeps_all_columns() {
        let csv = "\
cliente,2025-01 (1-15),2025-01 (1-fine),2025-01_coeff,categoria
Acme,10,20,50,ricorrente
Beta,0,5,40,
";
        let f = write_temp_csv(csv);
        let records = load_raw_budget(f.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].client, "Acme");
        assert_eq!(records[0].cells.len(), 4);
        assert_eq!(
            records[0].cells[0],
            ("2025-01 (1-15)".to_string(), "10".to_string())
        );
        assert_eq!(
            records[0].cells[3],
            ("categoria".to_string(), "ricorrente".to_string())
        );
    }

    #[test]
    fn test_load_raw_budget_skips_empty_client() {
        let csv = "cliente,2025-01 (1-fine)\nAcme,10\n,99\n";
        let f = write_temp_csv(csv);
        let records = load_raw_budget(f.path()).unwrap();
        assert_eq!(records.len(), 1);
    }
}
