use crate::bundle::read_table;
use crate::error::QcmrError;
use crate::model::{calendar_month, fiscal_index, CanonicalTable, FISCAL_MONTHS};
use crate::report::{ReportKind, Section};
use crate::tag::ReportTag;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const TAX_LINES: [&str; 7] = [
    "real_estate_tax",
    "wage_earnings_net_profits",
    "realty_transfer_tax",
    "sales_tax",
    "birt",
    "beverage_tax",
    "other_taxes",
];

const SPENDING_NAMES: &[(&str, &str)] = &[
    ("advances_misc_payments", "Advances / Labor Obligations"),
    ("contributions_indemnities", "Contributions / Indemnities"),
    ("debt_service", "Debt Service"),
    ("employee_benefits", "Employee Benefits"),
    ("materials_equipment", "Materials / Equipment"),
    ("payroll", "Payroll"),
    ("pension", "Pension"),
    ("prior_year", "Prior Year Payments"),
    ("purchases_of_services", "Contracts / Leases"),
    ("total_disbursements", "Total Disbursements"),
];

const REVENUE_NAMES: &[(&str, &str)] = &[
    ("beverage_tax", "Beverage Tax"),
    ("birt", "BIRT"),
    ("locally_generated_non_tax", "Locally Generated Non-Tax"),
    ("other_taxes", "Other Taxes"),
    ("prior_year_revenue", "Prior Year Revenue"),
    ("real_estate_tax", "Real Estate Tax"),
    ("realty_transfer_tax", "Realty Transfer Tax"),
    ("sales_tax", "Sales Tax"),
    ("total_cash_receipts", "Total Cash Receipts"),
    ("total_other_govts", "Other Governments"),
    ("total_tax_revenue", "Total Tax Revenue"),
    ("wage_earnings_net_profits", "Wage, Earnings, Net Profits"),
];

const FUND_BALANCE_NAMES: &[(&str, &str)] = &[
    ("general_fund", "General Fund"),
    ("grants_revenue", "Grants Fund"),
    ("total_capital_funds", "Total Capital Funds"),
    ("total_fund_equity", "Consolidated Cash"),
];

const BALANCE_SHEET_NAMES: &[(&str, &str)] = &[
    ("opening_balance", "Opening Balance"),
    ("receipts_minus_disbursements", "Receipts - Disbursements"),
    ("tran", "TRAN"),
];

/// Reporting name of a category; `None` for components and other lines
/// left out of reports.
pub fn display_name(section: Section, key: &str) -> Option<&'static str> {
    let names = match section {
        Section::GfSpending => SPENDING_NAMES,
        Section::GfRevenue => REVENUE_NAMES,
        Section::FundBalances => FUND_BALANCE_NAMES,
        Section::GfBalanceSheet => BALANCE_SHEET_NAMES,
        _ => return None,
    };
    names.iter().find(|(k, _)| *k == key).map(|(_, name)| *name)
}

/// One month of one report: every category's value.
#[derive(Debug, Clone, PartialEq)]
pub struct CashRecord {
    pub fiscal_year: u32,
    pub quarter: u32,
    /// Calendar month, 1 = January.
    pub month: u32,
    pub values: BTreeMap<String, f64>,
}

impl CashRecord {
    pub fn tag(&self) -> Option<ReportTag> {
        ReportTag::new(self.fiscal_year, self.quarter).ok()
    }

    /// Missing when the category is absent.
    pub fn value(&self, category: &str) -> f64 {
        self.values.get(category).copied().unwrap_or(f64::NAN)
    }

    /// Zero-based position of the month in the fiscal year.
    pub fn fiscal_month(&self) -> usize {
        fiscal_index(self.month)
    }
}

/// A cash forecast section across every processed report.
#[derive(Debug, Clone, Default)]
pub struct CashSeries {
    pub records: Vec<CashRecord>,
}

impl CashSeries {
    /// Records of one report, in fiscal month order.
    pub fn report(&self, fiscal_year: u32, quarter: u32) -> Vec<&CashRecord> {
        let mut out: Vec<&CashRecord> = self
            .records
            .iter()
            .filter(|r| r.fiscal_year == fiscal_year && r.quarter == quarter)
            .collect();
        out.sort_by_key(|r| r.fiscal_month());
        out
    }

    pub fn record(&self, fiscal_year: u32, quarter: u32, month: u32) -> Option<&CashRecord> {
        self.records
            .iter()
            .find(|r| r.fiscal_year == fiscal_year && r.quarter == quarter && r.month == month)
    }

    pub fn has_report(&self, fiscal_year: u32, quarter: u32) -> bool {
        self.records
            .iter()
            .any(|r| r.fiscal_year == fiscal_year && r.quarter == quarter)
    }

    /// Every category present in any record, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.values.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Reports present, oldest first.
    pub fn tags(&self) -> Vec<ReportTag> {
        let mut tags: Vec<ReportTag> = self.records.iter().filter_map(|r| r.tag()).collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Turn one report's table into one record per month.
pub fn records_from_table(tag: ReportTag, table: &CanonicalTable) -> Vec<CashRecord> {
    table
        .columns
        .iter()
        .enumerate()
        .filter_map(|(c, column)| {
            let fiscal = FISCAL_MONTHS.iter().position(|m| m == column)?;
            let values = table
                .rows
                .iter()
                .map(|row| (row.key.clone(), row.values[c]))
                .collect();
            Some(CashRecord {
                fiscal_year: tag.fiscal_year,
                quarter: tag.quarter,
                month: calendar_month(fiscal),
                values,
            })
        })
        .collect()
}

/// Add the combined categories used in comparisons.
pub fn derive_columns(section: Section, record: &mut CashRecord) {
    let values = &mut record.values;
    match section {
        Section::GfRevenue => {
            // missing tax lines are skipped rather than poisoning the total
            let total: f64 = TAX_LINES
                .iter()
                .filter_map(|k| values.get(*k))
                .filter(|v| !v.is_nan())
                .sum();
            values.insert("total_tax_revenue".into(), total);
            if let Some(pica) = values.get("total_pica_other_govts").copied() {
                if let Some(other) = values.get_mut("total_other_govts") {
                    *other += pica;
                }
            }
        }
        Section::GfSpending => {
            let sum = |a: &str, b: &str| {
                values.get(a).copied().unwrap_or(f64::NAN)
                    + values.get(b).copied().unwrap_or(f64::NAN)
            };
            let debt = sum("debt_service_short", "debt_service_long");
            let prior = sum(
                "prior_year_salaries_vouchers_payable",
                "prior_year_expenditures_against_encumbrances",
            );
            values.insert("debt_service".into(), debt);
            values.insert("prior_year".into(), prior);
        }
        _ => {}
    }
}

/// The processed cash forecast directories under `data_dir`, sorted.
fn cash_forecast_dirs(data_dir: &Path) -> Result<Vec<PathBuf>, QcmrError> {
    let root = glob::Pattern::escape(&data_dir.join("processed").to_string_lossy());
    let pattern = format!("{}/FY*_Q*/{}", root, ReportKind::CashForecast.title());
    let mut dirs: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| QcmrError::InvalidComparison(format!("bad search pattern: {e}")))?
        .filter_map(|entry| match entry {
            Ok(path) if path.is_dir() => Some(path),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// The tag named by the report directory holding a bundle, e.g. `FY19_Q2`.
fn report_dir_tag(bundle_dir: &Path) -> Option<ReportTag> {
    let name = bundle_dir.parent()?.file_name()?.to_str()?;
    match name.parse() {
        Ok(tag) => Some(tag),
        Err(_) => {
            debug!(dir = %bundle_dir.display(), "not a report directory");
            None
        }
    }
}

/// Concatenate one cash forecast section across every processed report.
pub fn load_cash_series(data_dir: &Path, section: Section) -> Result<CashSeries, QcmrError> {
    if section.kind() != ReportKind::CashForecast {
        return Err(QcmrError::InvalidComparison(format!(
            "'{}' is not a cash forecast section",
            section
        )));
    }

    let mut series = CashSeries::default();
    for dir in cash_forecast_dirs(data_dir)? {
        let Some(tag) = report_dir_tag(&dir) else {
            continue;
        };
        let path = dir.join(format!("{}.csv", section.as_str()));
        let table = read_table(&path, section.as_str())?;
        let mut records = records_from_table(tag, &table);
        for record in &mut records {
            derive_columns(section, record);
        }
        debug!(tag = %tag, section = %section, months = records.len(), "loaded report");
        series.records.extend(records);
    }

    if series.records.is_empty() {
        return Err(QcmrError::InvalidComparison(format!(
            "no processed '{}' data under {}",
            section,
            data_dir.join("processed").display()
        )));
    }
    Ok(series)
}
