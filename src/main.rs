use anyhow::{bail, Result};
use std::env;
use std::path::{Path, PathBuf};

use budget_variance::{
    aggregate_entries, align, build_report, check_gate, load_raw_budget, load_time_entries,
    normalize, write_report, CategoryStore, GateStatus, PeriodScope,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: budget-variance <actuals.csv> <budget.csv> [report_dir] [categories.db]");
        eprintln!();
        eprintln!("  actuals.csv    time entries: cliente, data, ore");
        eprintln!("  budget.csv     one row per client, period columns like \"2025-03 (1-fine)\"");
        eprintln!("  report_dir     output directory (default: report/)");
        eprintln!("  categories.db  client category store (default: categories.db)");
        std::process::exit(2);
    }

    let actuals_path = Path::new(&args[1]);
    let budget_path = Path::new(&args[2]);
    let report_dir: PathBuf = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("report"));
    let store_path: PathBuf = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("categories.db"));

    run(actuals_path, budget_path, &report_dir, &store_path)
}

fn run(actuals_path: &Path, budget_path: &Path, report_dir: &Path, store_path: &Path) -> Result<()> {
    println!("📊 Budget vs Actual Reconciliation");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load actual time entries
    println!("\n📂 Loading actuals...");
    let (entries, stats) = load_time_entries(actuals_path)?;
    println!("✓ {}", stats.summary());

    // 2. Load and normalize the budget table
    println!("\n📋 Loading budget...");
    let records = load_raw_budget(budget_path)?;
    let budget = normalize(&records)?;
    println!(
        "✓ {} clients, {} period columns",
        budget.hours.clients().len(),
        budget.hours.periods().len()
    );
    for warning in &budget.warnings {
        eprintln!("⚠️  {}", warning.message());
    }

    // 3. Aggregate and align
    println!("\n🧮 Aligning...");
    let actual = aggregate_entries(&entries);
    let aligned = align(&budget.hours, &actual, PeriodScope::Shared);
    println!(
        "✓ {} clients × {} shared periods",
        aligned.client_count(),
        aligned.period_count()
    );
    if aligned.is_empty() {
        bail!("budget and actuals share no periods; nothing to reconcile");
    }

    // 4. Category gate: every aligned client must be categorized
    println!("\n🏷️  Checking categories...");
    let store = CategoryStore::open(store_path)?;
    let seeded = store.seed_from_budget(&budget.categories)?;
    if seeded > 0 {
        println!("✓ Seeded {} categories from the budget table", seeded);
    }
    let assignments = store.get_all()?;
    match check_gate(&aligned.clients, &assignments) {
        GateStatus::Ready => println!("✓ All {} clients categorized", aligned.client_count()),
        GateStatus::Blocked { missing } => {
            eprintln!("❌ {} clients need a category before the report can be released:", missing.len());
            for client in &missing {
                eprintln!("   - {}", client);
            }
            bail!("category gate blocked");
        }
    }

    // 5. Classify, roll up, export
    println!("\n📥 Writing report...");
    let report = build_report(&aligned);
    write_report(report_dir, &report)?;
    println!(
        "✓ {} detail rows, {} month, {} quarter, {} total → {}",
        report.detail.len(),
        report.month.len(),
        report.quarter.len(),
        report.total.len(),
        report_dir.display()
    );

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Reconciliation complete");

    Ok(())
}
