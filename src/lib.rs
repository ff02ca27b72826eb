// Budget vs Actual Reconciliation - Core Library
// Exposes all modules for use in the CLI and tests

pub mod period;
pub mod import;
pub mod actuals;
pub mod budget;
pub mod align;
pub mod classify;
pub mod rollup;
pub mod category;
pub mod export;

// Re-export commonly used types
pub use period::{Half, Period};
pub use import::{
    ImportStats, RawBudgetRecord, TimeEntry,
    load_raw_budget, load_time_entries, parse_entry_date, parse_hours,
};
pub use actuals::{aggregate_entries, HoursTable};
pub use budget::{normalize, BudgetError, CellWarning, NormalizedBudget};
pub use align::{align, AlignedMatrix, PeriodScope};
pub use classify::{classify, classify_matrix, ClassifiedMatrix, VarianceOutcome};
pub use rollup::{
    build_report, roll_up, GroupKey, Grouping, RollupRow, VarianceReport,
};
pub use category::{
    check_gate, CategoryStore, ClientCategory, GateStatus,
};
pub use export::{
    read_report_file, write_report, ParsedReportRow, ReportParseError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
