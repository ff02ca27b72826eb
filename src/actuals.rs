// ⏱️ Actual-Hours Aggregator - Time entries → period buckets
//
// Every entry feeds the FullMonth bucket of its (year, month); entries on
// day 1-15 additionally feed the FirstHalf bucket. FirstHalf contributions
// are therefore a subset of FullMonth contributions, which guarantees
// FullMonth(y,m) >= FirstHalf(y,m) for every client.

use crate::import::TimeEntry;
use crate::period::Period;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// HOURS TABLE
// ============================================================================

/// Sparse (client, period) → hours table with deterministic iteration order.
/// Both the aggregated actuals and the normalized budget use this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoursTable {
    cells: BTreeMap<String, BTreeMap<Period, f64>>,
}

impl HoursTable {
    pub fn new() -> Self {
        HoursTable { cells: BTreeMap::new() }
    }

    /// Add hours to a cell, creating it if absent
    pub fn add(&mut self, client: &str, period: Period, hours: f64) {
        *self
            .cells
            .entry(client.to_string())
            .or_default()
            .entry(period)
            .or_insert(0.0) += hours;
    }

    /// Overwrite a cell
    pub fn set(&mut self, client: &str, period: Period, hours: f64) {
        self.cells
            .entry(client.to_string())
            .or_default()
            .insert(period, hours);
    }

    /// Hours for a cell; None when the cell was never written
    pub fn get(&self, client: &str, period: Period) -> Option<f64> {
        self.cells.get(client).and_then(|row| row.get(&period)).copied()
    }

    /// Sorted client names
    pub fn clients(&self) -> Vec<String> {
        self.cells.keys().cloned().collect()
    }

    /// Sorted distinct periods across all clients
    pub fn periods(&self) -> Vec<Period> {
        let mut periods: Vec<Period> = self
            .cells
            .values()
            .flat_map(|row| row.keys().copied())
            .collect();
        periods.sort();
        periods.dedup();
        periods
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Sum time entries into (client, period) buckets.
///
/// Entries are assumed pre-validated by the importer (valid date, hours >= 0).
pub fn aggregate_entries(entries: &[TimeEntry]) -> HoursTable {
    let mut table = HoursTable::new();

    for entry in entries {
        let year = entry.date.year();
        let month = entry.date.month();

        table.add(&entry.client, Period::full_month(year, month), entry.hours);
        if entry.date.day() <= 15 {
            table.add(&entry.client, Period::first_half(year, month), entry.hours);
        }
    }

    table
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(client: &str, y: i32, m: u32, d: u32, hours: f64) -> TimeEntry {
        TimeEntry {
            client: client.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            hours,
        }
    }

    #[test]
    fn test_first_half_and_full_month_buckets() {
        // Days [3, 10, 20], hours [5, 5, 5] → FirstHalf = 10, FullMonth = 15
        let entries = vec![
            entry("Acme", 2025, 3, 3, 5.0),
            entry("Acme", 2025, 3, 10, 5.0),
            entry("Acme", 2025, 3, 20, 5.0),
        ];
        let table = aggregate_entries(&entries);

        assert_eq!(table.get("Acme", Period::first_half(2025, 3)), Some(10.0));
        assert_eq!(table.get("Acme", Period::full_month(2025, 3)), Some(15.0));
    }

    #[test]
    fn test_day_15_is_first_half_day_16_is_not() {
        let entries = vec![
            entry("Acme", 2025, 5, 15, 4.0),
            entry("Acme", 2025, 5, 16, 6.0),
        ];
        let table = aggregate_entries(&entries);

        assert_eq!(table.get("Acme", Period::first_half(2025, 5)), Some(4.0));
        assert_eq!(table.get("Acme", Period::full_month(2025, 5)), Some(10.0));
    }

    #[test]
    fn test_last_day_of_month_counts_in_full_month() {
        let entries = vec![entry("Acme", 2024, 2, 29, 8.0)]; // leap day
        let table = aggregate_entries(&entries);

        assert_eq!(table.get("Acme", Period::first_half(2024, 2)), None);
        assert_eq!(table.get("Acme", Period::full_month(2024, 2)), Some(8.0));
    }

    #[test]
    fn test_full_month_superset_invariant() {
        let entries = vec![
            entry("Acme", 2025, 1, 2, 3.5),
            entry("Acme", 2025, 1, 14, 1.5),
            entry("Acme", 2025, 1, 28, 9.0),
            entry("Beta", 2025, 1, 31, 2.0),
            entry("Beta", 2025, 2, 1, 6.0),
        ];
        let table = aggregate_entries(&entries);

        for client in table.clients() {
            for period in table.periods() {
                if period.is_full_month() {
                    continue;
                }
                let fh = table.get(&client, period).unwrap_or(0.0);
                let fm = table.get(&client, period.month_key()).unwrap_or(0.0);
                assert!(
                    fm >= fh,
                    "{}: FullMonth {} < FirstHalf {}",
                    client,
                    fm,
                    fh
                );
            }
        }
    }

    #[test]
    fn test_clients_and_periods_are_sorted() {
        let entries = vec![
            entry("Zeta", 2025, 2, 1, 1.0),
            entry("Acme", 2025, 1, 20, 1.0),
        ];
        let table = aggregate_entries(&entries);

        assert_eq!(table.clients(), vec!["Acme".to_string(), "Zeta".to_string()]);
        assert_eq!(
            table.periods(),
            vec![
                Period::full_month(2025, 1),
                Period::first_half(2025, 2),
                Period::full_month(2025, 2),
            ]
        );
    }
}
