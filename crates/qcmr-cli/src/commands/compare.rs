use qcmr_core::analysis::cash_report::{projected_changes, projection_accuracy};
use qcmr_core::analysis::revisions::fund_balance_revisions;
use qcmr_core::analysis::{CashKind, CashReport, ComparisonKind};
use qcmr_core::config::AssemblerConfig;
use qcmr_core::error::QcmrError;

use crate::output;

pub fn run(
    config: &AssemblerConfig,
    kind: &str,
    year: u32,
    quarter: u32,
    output_format: &str,
) -> Result<(), QcmrError> {
    let kind: ComparisonKind = kind.parse()?;
    let report = CashReport::new(&config.data_dir, year, quarter)?;
    let comparisons = report.compare(kind)?;

    match output_format {
        "json" => output::json::print(&comparisons)?,
        _ => output::table::print_comparisons(&comparisons),
    }
    Ok(())
}

pub fn accuracy(
    config: &AssemblerConfig,
    kind: &str,
    quarter: u32,
    output_format: &str,
) -> Result<(), QcmrError> {
    let kind: CashKind = kind.parse()?;
    let rows = projection_accuracy(&config.data_dir, kind, quarter)?;

    match output_format {
        "json" => output::json::print(&rows)?,
        _ => output::table::print_accuracy(kind, quarter, &rows),
    }
    Ok(())
}

pub fn changes(
    config: &AssemblerConfig,
    quarter: u32,
    output_format: &str,
) -> Result<(), QcmrError> {
    let changes = projected_changes(&config.data_dir, quarter)?;

    match output_format {
        "json" => output::json::print(&changes)?,
        _ => output::table::print_changes(quarter, &changes),
    }
    Ok(())
}

pub fn revisions(config: &AssemblerConfig, output_format: &str) -> Result<(), QcmrError> {
    let revisions = fund_balance_revisions(&config.data_dir)?;

    match output_format {
        "json" => output::json::print(&revisions)?,
        _ => output::table::print_revisions(&revisions),
    }
    Ok(())
}
