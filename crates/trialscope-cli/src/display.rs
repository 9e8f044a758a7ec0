//! Console rendering of pipeline and collector summaries.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use trialscope_collect::TrialCollection;
use trialscope_core::FlattenReport;
use trialscope_ml::report::{GroupRate, MIN_GROUP_SIZE, ValueCount};
use trialscope_ml::{CompletionReport, DrugComparison, QualityReport};
use trialscope_store::{AssemblyReport, TableShape};

const TOP_COLLECTION_GROUPS: usize = 5;

const PREVIEW_COLUMNS: &[&str] = &[
    "nct_id",
    "overall_status",
    "phase",
    "enrollment_count",
    "start_date",
    "completion_date",
    "duration_days",
];

// ── Clean ──

pub fn print_flatten_summary(report: &FlattenReport, assembly: &AssemblyReport) {
    println!("=== Flattening ===");
    println!("  {:<26} {}", "processed", report.rows);
    println!("  {:<26} {}", "errors", report.errors);
    for (index, err) in &report.error_details {
        println!("    record {index}: {err}");
    }
    println!("  {:<26} {}", "table shape", assembly.shape);
    let unparsed = [
        ("unparsed enrollment", assembly.unparsed_enrollment),
        ("unparsed start dates", assembly.unparsed_start_dates),
        ("unparsed completion dates", assembly.unparsed_completion_dates),
    ];
    for (label, count) in unparsed {
        if count > 0 {
            println!("  {label:<26} {count}");
        }
    }
    println!();
}

pub fn print_quality_report(report: &QualityReport) {
    println!("=== Data Quality ===");
    println!("  {:<26} {}", "rows", report.rows);
    println!();

    if !report.missing.is_empty() {
        println!("Missing values");
        for m in &report.missing {
            println!("  {:<26} {:>7} ({:>5.1}%)", m.column, m.count, m.percent);
        }
        println!();
    }

    print_value_counts("Phase distribution", &report.phase_distribution, report.rows);
    print_value_counts("Status distribution", &report.status_distribution, report.rows);

    if let Some(d) = &report.enrollment {
        println!("Enrollment");
        println!("  {:<26} {}", "count", d.count);
        println!("  {:<26} {:.1}", "mean", d.mean);
        match d.std {
            Some(std) => println!("  {:<26} {:.1}", "std", std),
            None => println!("  {:<26} -", "std"),
        }
        println!("  {:<26} {:.1}", "min", d.min);
        println!("  {:<26} {:.1}", "25%", d.q25);
        println!("  {:<26} {:.1}", "50%", d.median);
        println!("  {:<26} {:.1}", "75%", d.q75);
        println!("  {:<26} {:.1}", "max", d.max);
        println!();
    }
}

/// First `limit` rows of a few identifying columns.
pub fn print_preview(batch: &RecordBatch, limit: usize) -> anyhow::Result<()> {
    let schema = batch.schema();
    let indices: Vec<usize> = PREVIEW_COLUMNS
        .iter()
        .filter_map(|name| schema.index_of(name).ok())
        .collect();
    let preview = batch
        .project(&indices)?
        .slice(0, limit.min(batch.num_rows()));
    println!("{}", pretty_format_batches(&[preview])?);
    println!();
    Ok(())
}

// ── Label ──

pub fn print_completion_report(report: &CompletionReport) {
    println!("=== Completion Labels ===");
    println!("  {:<26} {}", "total trials", report.total_trials);
    println!();
    print_value_counts("Status breakdown", &report.status_breakdown, report.total_trials);

    println!("Labeled examples: {}", report.labeled);
    println!(
        "  Completed (label=1):     {:>6} ({:.1}%)",
        report.completed,
        percent(report.completed, report.labeled)
    );
    println!(
        "  Not completed (label=0): {:>6} ({:.1}%)",
        report.not_completed,
        percent(report.not_completed, report.labeled)
    );
    println!();

    print_rates("Completion by phase", &report.by_phase, true);
    print_rates("Completion by sponsor class", &report.by_sponsor_class, true);
    if let Some(rates) = &report.by_randomization {
        print_rates("Completion by randomization", rates, false);
    }
    if let Some(rates) = &report.by_enrollment {
        print_rates("Completion by enrollment", rates, true);
    }
}

pub fn print_drug_comparison(cmp: &DrugComparison) {
    println!("=== Approved Drugs ===");
    println!(
        "  Trials testing approved drugs: {} ({:.1}%)",
        cmp.approved,
        cmp.approved_percent()
    );
    if let (Some(approved), Some(other)) = (cmp.approved_rate, cmp.other_rate) {
        println!("  Completion rates:");
        println!("    {:<24} {:.1}%", "testing approved drug", approved * 100.0);
        println!("    {:<24} {:.1}%", "testing other drugs", other * 100.0);
        if let Some(diff) = cmp.difference_points() {
            println!("    {:<24} {:+.1} percentage points", "difference", diff);
        }
    }
    println!();
}

// ── Collection ──

pub fn print_collection_summary(collection: &TrialCollection) {
    let total = collection.len();
    println!("=== Trial Collection ===");
    println!("  {:<26} {}", "trials", total);
    println!("  {:<26} {}", "pages", collection.pages);
    println!("  {:<26} {}", "resolved outcomes", collection.resolved_outcomes());
    if collection.skipped > 0 {
        println!("  {:<26} {}", "skipped (no id)", collection.skipped);
    }
    if let Some(reason) = &collection.stopped_by {
        println!("  {:<26} {}", "stopped early", reason);
    }
    println!();

    for (header, counts) in [
        ("Top statuses", collection.top_statuses(TOP_COLLECTION_GROUPS)),
        ("Top phases", collection.top_phases(TOP_COLLECTION_GROUPS)),
    ] {
        println!("{header}");
        for (value, count) in counts {
            println!("  {:<30} {:>6} ({:>5.1}%)", value, count, percent(count, total));
        }
        println!();
    }
}

pub fn print_file_info(path: &Path, bytes: u64, shape: Option<TableShape>) {
    println!("Saved: {}", path.display());
    println!("  {:<26} {:.2} MB", "size", bytes as f64 / (1024.0 * 1024.0));
    if let Some(shape) = shape {
        println!("  {:<26} {}", "shape", shape);
    }
    println!();
}

// ── Helpers ──

fn print_value_counts(header: &str, counts: &[ValueCount], total: usize) {
    if counts.is_empty() {
        return;
    }
    println!("{header}");
    for vc in counts {
        let value = if vc.value.is_empty() { "(empty)" } else { &vc.value };
        println!("  {:<26} {:>7} ({:>5.1}%)", value, vc.count, percent(vc.count, total));
    }
    println!();
}

/// Small groups are skipped when `hide_small` is set.
fn print_rates(header: &str, rates: &[GroupRate], hide_small: bool) {
    let shown: Vec<&GroupRate> = rates
        .iter()
        .filter(|r| !hide_small || r.count > MIN_GROUP_SIZE)
        .collect();
    if shown.is_empty() {
        return;
    }
    println!("{header}");
    for r in shown {
        let group = if r.group.is_empty() { "(empty)" } else { &r.group };
        println!(
            "  {:<20} {:>5} trials, {:>5.1}% complete",
            group,
            r.count,
            r.rate * 100.0
        );
    }
    println!();
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
