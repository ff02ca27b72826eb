// 📊 Aggregation Engine - Roll classified cells up to coarser groupings
//
// The one rule that matters: sum raw budget hours and raw actual hours over
// the group FIRST, then classify the sums ONCE. Averaging per-period
// percentages (or worse, averaging over Extrabudget/Undefined cells) gives
// different, wrong answers - e.g. a quarter of budgets [100, 0, 50] and
// actuals [90, 20, 0] is Percentage(26.7) from the summed hours, not any
// average of {10%, Extrabudget, 100%}.
//
// Month, quarter and total groupings sum FullMonth periods only: FirstHalf
// hours are a subset of the same month's FullMonth hours and would
// double-count.

use crate::align::AlignedMatrix;
use crate::classify::{classify, VarianceOutcome};
use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// GROUPING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grouping {
    /// One row per aligned period (no aggregation)
    SinglePeriod,

    /// Calendar month, via its FullMonth period only
    Month,

    /// Calendar quarter
    Quarter,

    /// The entire horizon
    Total,
}

impl Grouping {
    pub fn name(&self) -> &'static str {
        match self {
            Grouping::SinglePeriod => "detail",
            Grouping::Month => "month",
            Grouping::Quarter => "quarter",
            Grouping::Total => "total",
        }
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    Period(Period),
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Total,
}

impl GroupKey {
    pub fn label(&self) -> String {
        match self {
            GroupKey::Period(p) => p.label(),
            GroupKey::Month { year, month } => format!("{:04}-{:02}", year, month),
            GroupKey::Quarter { year, quarter } => format!("{:04}-Q{}", year, quarter),
            GroupKey::Total => "totale".to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// ROLLUP ROW
// ============================================================================

/// One reconciled result per (client, grouping key). Raw hour sums are kept
/// alongside the outcome so exports can show both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRow {
    pub client: String,
    pub key: GroupKey,
    pub budget_hours: f64,
    pub actual_hours: f64,
    pub outcome: VarianceOutcome,
}

// ============================================================================
// ROLL-UP
// ============================================================================

fn key_for(period: Period, grouping: Grouping) -> Option<GroupKey> {
    match grouping {
        Grouping::SinglePeriod => Some(GroupKey::Period(period)),
        // Coarser groupings take FullMonth periods only
        Grouping::Month if period.is_full_month() => Some(GroupKey::Month {
            year: period.year,
            month: period.month,
        }),
        Grouping::Quarter if period.is_full_month() => Some(GroupKey::Quarter {
            year: period.year,
            quarter: period.quarter(),
        }),
        Grouping::Total if period.is_full_month() => Some(GroupKey::Total),
        _ => None,
    }
}

/// Roll an aligned matrix up to a grouping: sum raw hours per
/// (client, group key), then classify each sum once.
///
/// Output rows are sorted by (client, key) and cover every client in the
/// matrix for every key its periods produce.
pub fn roll_up(aligned: &AlignedMatrix, grouping: Grouping) -> Vec<RollupRow> {
    let mut sums: BTreeMap<(String, GroupKey), (f64, f64)> = BTreeMap::new();

    for (ci, client) in aligned.clients.iter().enumerate() {
        for (pi, period) in aligned.periods.iter().enumerate() {
            let Some(key) = key_for(*period, grouping) else {
                continue;
            };
            let entry = sums.entry((client.clone(), key)).or_insert((0.0, 0.0));
            entry.0 += aligned.budget_at(ci, pi);
            entry.1 += aligned.actual_at(ci, pi);
        }
    }

    sums.into_iter()
        .map(|((client, key), (budget_hours, actual_hours))| RollupRow {
            client,
            key,
            budget_hours,
            actual_hours,
            outcome: classify(budget_hours, actual_hours),
        })
        .collect()
}

// ============================================================================
// FULL REPORT
// ============================================================================

/// All four granularities of the same aligned matrix, computed in one pass
/// per grouping. Recomputed from scratch whenever inputs change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub detail: Vec<RollupRow>,
    pub month: Vec<RollupRow>,
    pub quarter: Vec<RollupRow>,
    pub total: Vec<RollupRow>,
}

pub fn build_report(aligned: &AlignedMatrix) -> VarianceReport {
    VarianceReport {
        detail: roll_up(aligned, Grouping::SinglePeriod),
        month: roll_up(aligned, Grouping::Month),
        quarter: roll_up(aligned, Grouping::Quarter),
        total: roll_up(aligned, Grouping::Total),
    }
}

impl VarianceReport {
    pub fn rows_for(&self, grouping: Grouping) -> &[RollupRow] {
        match grouping {
            Grouping::SinglePeriod => &self.detail,
            Grouping::Month => &self.month,
            Grouping::Quarter => &self.quarter,
            Grouping::Total => &self.total,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuals::HoursTable;
    use crate::align::{align, PeriodScope};

    fn aligned_from(cells: &[(&str, Period, f64, f64)]) -> AlignedMatrix {
        let mut budget = HoursTable::new();
        let mut actual = HoursTable::new();
        for (client, period, b, a) in cells {
            budget.set(client, *period, *b);
            actual.set(client, *period, *a);
        }
        align(&budget, &actual, PeriodScope::All)
    }

    #[test]
    fn test_quarter_rollup_sums_then_classifies() {
        // Budgets [100, 0, 50], actuals [90, 20, 0] → 150 vs 110 → 26.7%
        let aligned = aligned_from(&[
            ("Acme", Period::full_month(2025, 1), 100.0, 90.0),
            ("Acme", Period::full_month(2025, 2), 0.0, 20.0),
            ("Acme", Period::full_month(2025, 3), 50.0, 0.0),
        ]);

        let rows = roll_up(&aligned, Grouping::Quarter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, GroupKey::Quarter { year: 2025, quarter: 1 });
        assert_eq!(rows[0].budget_hours, 150.0);
        assert_eq!(rows[0].actual_hours, 110.0);
        assert_eq!(rows[0].outcome, VarianceOutcome::Percentage(26.7));
    }

    #[test]
    fn test_first_half_periods_excluded_from_month_rollup() {
        // FirstHalf hours are a subset of FullMonth; counting both would
        // double the month.
        let aligned = aligned_from(&[
            ("Acme", Period::first_half(2025, 1), 10.0, 8.0),
            ("Acme", Period::full_month(2025, 1), 20.0, 16.0),
        ]);

        let rows = roll_up(&aligned, Grouping::Month);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, GroupKey::Month { year: 2025, month: 1 });
        assert_eq!(rows[0].budget_hours, 20.0);
        assert_eq!(rows[0].actual_hours, 16.0);
        assert_eq!(rows[0].outcome, VarianceOutcome::Percentage(20.0));
    }

    #[test]
    fn test_single_period_rollup_keeps_every_period() {
        let fh = Period::first_half(2025, 1);
        let fm = Period::full_month(2025, 1);
        let aligned = aligned_from(&[("Acme", fh, 10.0, 8.0), ("Acme", fm, 20.0, 16.0)]);

        let rows = roll_up(&aligned, Grouping::SinglePeriod);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, GroupKey::Period(fh));
        assert_eq!(rows[1].key, GroupKey::Period(fm));
    }

    #[test]
    fn test_total_rollup_spans_quarters_and_clients() {
        let aligned = aligned_from(&[
            ("Acme", Period::full_month(2025, 1), 100.0, 90.0),
            ("Acme", Period::full_month(2025, 7), 100.0, 60.0),
            ("Beta", Period::full_month(2025, 1), 0.0, 0.0),
        ]);

        let rows = roll_up(&aligned, Grouping::Total);
        assert_eq!(rows.len(), 2);

        // Sorted by client
        assert_eq!(rows[0].client, "Acme");
        assert_eq!(rows[0].budget_hours, 200.0);
        assert_eq!(rows[0].actual_hours, 150.0);
        assert_eq!(rows[0].outcome, VarianceOutcome::Percentage(25.0));

        // A client with nothing at all stays Undefined, even at total level
        assert_eq!(rows[1].client, "Beta");
        assert_eq!(rows[1].outcome, VarianceOutcome::Undefined);
    }

    #[test]
    fn test_extrabudget_only_when_whole_group_has_zero_budget() {
        let aligned = aligned_from(&[
            ("Acme", Period::full_month(2025, 4), 0.0, 12.0),
            ("Acme", Period::full_month(2025, 5), 0.0, 3.0),
        ]);

        let rows = roll_up(&aligned, Grouping::Quarter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].outcome, VarianceOutcome::Extrabudget);
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        // Summing two disjoint period sets then classifying equals summing
        // their already-summed raw hours then classifying.
        let q1 = [
            ("Acme", Period::full_month(2025, 1), 100.0, 90.0),
            ("Acme", Period::full_month(2025, 2), 0.0, 20.0),
        ];
        let q1_more = [("Acme", Period::full_month(2025, 3), 50.0, 0.0)];

        let all: Vec<_> = q1.iter().chain(q1_more.iter()).copied().collect();
        let combined = roll_up(&aligned_from(&all), Grouping::Quarter);

        let partial_a = roll_up(&aligned_from(&q1), Grouping::Quarter);
        let partial_b = roll_up(&aligned_from(&q1_more), Grouping::Quarter);
        let merged_budget = partial_a[0].budget_hours + partial_b[0].budget_hours;
        let merged_actual = partial_a[0].actual_hours + partial_b[0].actual_hours;

        assert_eq!(combined[0].budget_hours, merged_budget);
        assert_eq!(combined[0].actual_hours, merged_actual);
        assert_eq!(combined[0].outcome, classify(merged_budget, merged_actual));
    }

    #[test]
    fn test_months_in_different_years_stay_separate() {
        let aligned = aligned_from(&[
            ("Acme", Period::full_month(2024, 12), 10.0, 10.0),
            ("Acme", Period::full_month(2025, 12), 10.0, 5.0),
        ]);

        let rows = roll_up(&aligned, Grouping::Month);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, GroupKey::Month { year: 2024, month: 12 });
        assert_eq!(rows[1].key, GroupKey::Month { year: 2025, month: 12 });
    }
}
