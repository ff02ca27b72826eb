// ⚖️ Variance Classifier - Budgeted vs actual hours, three-way outcome
//
// For an aligned cell (budget = b, actual = a):
//   b > 0            → Percentage((b - a) / b * 100), one decimal, unclipped
//   b == 0 && a > 0  → Extrabudget (work with no plan)
//   b == 0 && a == 0 → Undefined (no plan, no work)
//
// The central invariant: Percentage(0) means on-budget (b > 0 and a == b)
// and is NEVER the same thing as Undefined. Earlier generations of this
// report encoded both as one numeric sentinel and produced misleading
// roll-ups; the tags stay distinct through the whole pipeline and are only
// rendered at the presentation boundary.

use crate::align::AlignedMatrix;
use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// VARIANCE OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VarianceOutcome {
    /// Remaining budget as a percentage of plan, rounded to one decimal.
    /// Positive = under budget, negative = over budget. Unbounded; clipping
    /// for display is a presentation concern.
    Percentage(f64),

    /// Work occurred with zero planned budget
    Extrabudget,

    /// No plan and no work at all
    Undefined,
}

impl VarianceOutcome {
    pub fn is_percentage(&self) -> bool {
        matches!(self, VarianceOutcome::Percentage(_))
    }

    pub fn is_extrabudget(&self) -> bool {
        matches!(self, VarianceOutcome::Extrabudget)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, VarianceOutcome::Undefined)
    }

    /// Numeric value for percentage outcomes only. Consumers must never do
    /// arithmetic on the other two tags.
    pub fn percentage(&self) -> Option<f64> {
        match self {
            VarianceOutcome::Percentage(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for VarianceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarianceOutcome::Percentage(p) => write!(f, "{:.1}%", p),
            VarianceOutcome::Extrabudget => write!(f, "Extrabudget"),
            VarianceOutcome::Undefined => write!(f, "Undefined"),
        }
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Classify one aligned cell.
///
/// Division by zero is structurally avoided: the percentage branch is only
/// taken when b > 0. Negative budgets (kept as provided by the normalizer)
/// fall into the percentage branch only when positive, so b < 0 classifies
/// like b == 0.
pub fn classify(budget: f64, actual: f64) -> VarianceOutcome {
    if budget > 0.0 {
        VarianceOutcome::Percentage(round1((budget - actual) / budget * 100.0))
    } else if actual > 0.0 {
        VarianceOutcome::Extrabudget
    } else {
        VarianceOutcome::Undefined
    }
}

// ============================================================================
// CLASSIFIED MATRIX
// ============================================================================

/// One VarianceOutcome per aligned cell, same index sets as the input matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMatrix {
    pub clients: Vec<String>,
    pub periods: Vec<Period>,
    outcomes: Vec<Vec<VarianceOutcome>>,
}

impl ClassifiedMatrix {
    pub fn outcome_at(&self, client_idx: usize, period_idx: usize) -> VarianceOutcome {
        self.outcomes[client_idx][period_idx]
    }

    pub fn outcome(&self, client: &str, period: Period) -> Option<VarianceOutcome> {
        let ci = self.clients.iter().position(|c| c == client)?;
        let pi = self.periods.iter().position(|p| *p == period)?;
        Some(self.outcomes[ci][pi])
    }
}

/// Classify every cell of an aligned matrix
pub fn classify_matrix(aligned: &AlignedMatrix) -> ClassifiedMatrix {
    let outcomes = (0..aligned.client_count())
        .map(|ci| {
            (0..aligned.period_count())
                .map(|pi| classify(aligned.budget_at(ci, pi), aligned.actual_at(ci, pi)))
                .collect()
        })
        .collect();

    ClassifiedMatrix {
        clients: aligned.clients.clone(),
        periods: aligned.periods.clone(),
        outcomes,
    }
}

// ============================================================================
// TESTS
// ============================================================================
