use qcmr_core::analysis::compare::AccuracyRow;
use qcmr_core::analysis::revisions::FundBalanceRevisions;
use qcmr_core::analysis::{CashKind, KindChanges, KindComparison};
use qcmr_core::bundle::TableBundle;
use qcmr_core::model::CanonicalTable;
use qcmr_core::report::assembler::ProcessedReport;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn month_abbr(month: u32) -> &'static str {
    MONTH_ABBR
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("?")
}

pub fn print_processed(reports: &[ProcessedReport]) {
    for report in reports {
        let how = if report.cached { "loaded" } else { "extracted" };
        println!("{} ({how})", report.kind.title());
        for (name, table) in report.bundle.iter() {
            println!(
                "  {:<18} {} rows x {} columns",
                name,
                table.rows.len(),
                table.columns.len()
            );
        }
        println!("  -> {}\n", report.dir.display());
    }
}

pub fn print_bundle(bundle: &TableBundle) {
    println!("=== {} ===\n", bundle.title);
    for (name, table) in bundle.iter() {
        print_table(name, table);
        println!();
    }
}

pub fn print_table(name: &str, table: &CanonicalTable) {
    println!("[{name}]");

    let key_width = table
        .keys()
        .map(|k| k.len())
        .chain(std::iter::once(table.key_column.len()))
        .max()
        .unwrap_or(10);
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.values.iter().map(|v| format_value(*v)).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(c, col)| {
            cells
                .iter()
                .map(|r| r[c].len())
                .chain(std::iter::once(col.len()))
                .max()
                .unwrap_or(8)
        })
        .collect();

    print!("  {:<key_width$}", table.key_column);
    for (col, w) in table.columns.iter().zip(&widths) {
        print!("  {:>w$}", col, w = *w);
    }
    println!();

    for (row, values) in table.rows.iter().zip(&cells) {
        print!("  {:<key_width$}", row.key);
        for (v, w) in values.iter().zip(&widths) {
            print!("  {:>w$}", v, w = *w);
        }
        println!();
    }
}

pub fn print_comparisons(comparisons: &[KindComparison]) {
    for kc in comparisons {
        let cmp = &kc.comparison;
        println!(
            "=== {}: {} vs {} ===\n",
            kc.kind, cmp.current_label, cmp.previous_label
        );

        let name_width = cmp.rows.iter().map(|r| r.name.len()).max().unwrap_or(10);
        let value_width = 14;
        println!(
            "  {:<name_width$}  {:<5}  {:>value_width$}  {:>value_width$}  {:>value_width$}",
            "Name", "Month", cmp.current_label, cmp.previous_label, "Change"
        );
        for row in &cmp.rows {
            println!(
                "  {:<name_width$}  {:<5}  {:>value_width$}  {:>value_width$}  {:>value_width$}",
                row.name,
                month_abbr(row.month),
                format_value(row.current),
                format_value(row.previous),
                format_value(row.current - row.previous)
            );
        }
        println!();
    }
}

pub fn print_accuracy(kind: CashKind, quarter: u32, rows: &[AccuracyRow]) {
    println!("=== {kind}: Actual - Q{quarter} Projection ===\n");
    if rows.is_empty() {
        println!("  No fiscal year has both a Q{quarter} and a Q4 report.");
        return;
    }

    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(10);
    println!("  {:<name_width$}  {:<11}  {:>14}", "Name", "Fiscal Year", "Difference");
    for row in rows {
        println!(
            "  {:<name_width$}  {:<11}  {:>14}",
            row.name,
            row.fiscal_year,
            format_value(row.difference)
        );
    }
}

fn format_percent(fraction: f64) -> String {
    if fraction.is_nan() {
        "-".to_string()
    } else {
        format!("{:.1}%", fraction * 100.0)
    }
}

pub fn print_changes(quarter: u32, changes: &[KindChanges]) {
    for kc in changes {
        println!("=== {}: Q{quarter} projected vs actual change ===\n", kc.kind);
        if kc.rows.is_empty() {
            println!("  No fiscal year has a Q{quarter} report and a prior Q4 report.\n");
            continue;
        }

        let name_width = kc.rows.iter().map(|r| r.name.len()).max().unwrap_or(10);
        println!(
            "  {:<name_width$}  {:<11}  {:>14}  {:>8}  {:>14}  {:>8}",
            "Name", "Fiscal Year", "Actual", "%", "Projected", "%"
        );
        for row in &kc.rows {
            println!(
                "  {:<name_width$}  {:<11}  {:>14}  {:>8}  {:>14}  {:>8}",
                row.name,
                row.fiscal_year,
                format_value(row.actual_change),
                format_percent(row.actual_change_percent),
                format_value(row.projected_change),
                format_percent(row.projected_change_percent)
            );
        }
        println!();
    }
}

pub fn print_revisions(revisions: &FundBalanceRevisions) {
    println!("=== End-of-year fund balance revisions ===\n");
    println!(
        "  {:<11}  {:>16}  {:>16}  {:>16}",
        "Fiscal Year", "Q4 Cash Balance", "Q1 Actual", "Fitted"
    );
    let fit = &revisions.fit;
    for p in &revisions.points {
        println!(
            "  {:<11}  {:>16}  {:>16}  {:>16}",
            p.fiscal_year,
            format_value(p.q4_cash_balance),
            format_value(p.q1_actual),
            format_value(fit.predict(p.q4_cash_balance))
        );
    }
    println!(
        "\n  Q1 Actual = {:.3} + {:.3} x Q4 Cash Balance  ({} years)",
        fit.intercept, fit.slope, fit.n
    );
}
