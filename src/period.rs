// 📅 Period Model - Canonical period identifiers
// Single source of truth for period semantics
//
// A period is either the first half of a calendar month (days 1-15) or the
// full month (day 1 through the last day). Column labels use the grammar:
//   "YYYY-MM (1-15)"   → first half
//   "YYYY-MM (1-fine)" → full month ("fine" = end of month)
//
// Labels that deviate from this exact shape are NOT periods. No whitespace
// tolerance, no separator coercion: auxiliary budget columns like
// "2025-03_coeff" must never be mistaken for period columns.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// HALF INDICATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Half {
    /// Days 1-15 of the month
    FirstHalf,

    /// Days 1 through the last day of the month (superset of FirstHalf)
    FullMonth,
}

impl Half {
    /// Suffix used inside the canonical column label
    pub fn suffix(&self) -> &'static str {
        match self {
            Half::FirstHalf => "1-15",
            Half::FullMonth => "1-fine",
        }
    }
}

// ============================================================================
// PERIOD
// ============================================================================

/// Immutable period value: (year, month, half)
///
/// Totally ordered by (year, month, half); FirstHalf sorts before FullMonth
/// within the same month. Equality is field-wise on all three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
    pub half: Half,
}

impl Period {
    pub fn first_half(year: i32, month: u32) -> Self {
        Period { year, month, half: Half::FirstHalf }
    }

    pub fn full_month(year: i32, month: u32) -> Self {
        Period { year, month, half: Half::FullMonth }
    }

    /// Parse a canonical period label.
    ///
    /// Accepts exactly `YYYY-MM (1-15)` and `YYYY-MM (1-fine)`. Returns None
    /// for anything else: extra whitespace, wrong separators, out-of-range
    /// months, missing zero-padding.
    pub fn parse_label(label: &str) -> Option<Period> {
        // Shape: "YYYY-MM (suffix)" → 4 digits, '-', 2 digits, ' (', suffix, ')'
        let rest = label.strip_suffix(')')?;
        let (prefix, suffix) = rest.split_once(" (")?;

        let half = match suffix {
            "1-15" => Half::FirstHalf,
            "1-fine" => Half::FullMonth,
            _ => return None,
        };

        let (year_str, month_str) = prefix.split_once('-')?;
        if year_str.len() != 4 || !year_str.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if month_str.len() != 2 || !month_str.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let year: i32 = year_str.parse().ok()?;
        let month: u32 = month_str.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        Some(Period { year, month, half })
    }

    /// Render the canonical column label back
    pub fn label(&self) -> String {
        format!("{:04}-{:02} ({})", self.year, self.month, self.half.suffix())
    }

    /// Calendar quarter (1-4) this period falls in
    pub fn quarter(&self) -> u32 {
        (self.month - 1) / 3 + 1
    }

    /// The FullMonth period of the same (year, month)
    pub fn month_key(&self) -> Period {
        Period::full_month(self.year, self.month)
    }

    pub fn is_full_month(&self) -> bool {
        self.half == Half::FullMonth
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// TESTS
// ============================================================================
