// 🧮 Alignment Engine - Two sparse tables → one rectangular pair
//
// Budget and actuals come from independent sources with different client
// sets and different period coverage. Alignment produces two same-shape
// dense matrices over the union of clients and the chosen period scope,
// zero-filling every missing cell.
//
// No missing-value markers survive past this stage. "No data" semantics
// live entirely in the classifier's explicit Undefined outcome, never in
// a float NaN that would silently corrupt downstream sums.

use crate::actuals::HoursTable;
use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// PERIOD SCOPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodScope {
    /// Intersection of both period sets: only jointly-observable periods.
    /// Default, used for detail views.
    Shared,

    /// Union of both period sets: surfaces budget-only and actual-only
    /// periods, used to detect structural mismatches between the sources.
    All,
}

// ============================================================================
// ALIGNED MATRIX
// ============================================================================

/// Pair of same-shape budget/actual matrices over sorted clients × periods.
/// Invariant: both matrices are fully rectangular and share the index sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedMatrix {
    pub clients: Vec<String>,
    pub periods: Vec<Period>,
    budget: Vec<Vec<f64>>,
    actual: Vec<Vec<f64>>,
}

impl AlignedMatrix {
    pub fn budget_at(&self, client_idx: usize, period_idx: usize) -> f64 {
        self.budget[client_idx][period_idx]
    }

    pub fn actual_at(&self, client_idx: usize, period_idx: usize) -> f64 {
        self.actual[client_idx][period_idx]
    }

    /// (budget, actual) for a named cell; None when client/period is not in
    /// the aligned index
    pub fn cell(&self, client: &str, period: Period) -> Option<(f64, f64)> {
        let ci = self.clients.iter().position(|c| c == client)?;
        let pi = self.periods.iter().position(|p| *p == period)?;
        Some((self.budget[ci][pi], self.actual[ci][pi]))
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() || self.periods.is_empty()
    }
}

// ============================================================================
// ALIGNMENT
// ============================================================================

/// Align a budget table and an actual table into a rectangular matrix pair.
pub fn align(budget: &HoursTable, actual: &HoursTable, scope: PeriodScope) -> AlignedMatrix {
    let mut clients: BTreeSet<String> = budget.clients().into_iter().collect();
    clients.extend(actual.clients());
    let clients: Vec<String> = clients.into_iter().collect();

    let budget_periods: BTreeSet<Period> = budget.periods().into_iter().collect();
    let actual_periods: BTreeSet<Period> = actual.periods().into_iter().collect();

    let periods: Vec<Period> = match scope {
        PeriodScope::Shared => budget_periods
            .intersection(&actual_periods)
            .copied()
            .collect(),
        PeriodScope::All => budget_periods.union(&actual_periods).copied().collect(),
    };

    let mut budget_matrix = vec![vec![0.0; periods.len()]; clients.len()];
    let mut actual_matrix = vec![vec![0.0; periods.len()]; clients.len()];

    for (ci, client) in clients.iter().enumerate() {
        for (pi, period) in periods.iter().enumerate() {
            budget_matrix[ci][pi] = budget.get(client, *period).unwrap_or(0.0);
            actual_matrix[ci][pi] = actual.get(client, *period).unwrap_or(0.0);
        }
    }

    AlignedMatrix {
        clients,
        periods,
        budget: budget_matrix,
        actual: actual_matrix,
    }
}

// ============================================================================
// TESTS
// ============================================================================
