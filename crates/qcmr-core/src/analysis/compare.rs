//! Month-by-month comparisons between two reports of a cash series.

use super::series::{CashRecord, CashSeries};
use crate::error::QcmrError;
use crate::model::{calendar_month, fiscal_index};
use crate::tag::ReportTag;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonKind {
    LastQuarter,
    FirstQuarter,
    LastYear,
}

impl ComparisonKind {
    pub const ALL: [ComparisonKind; 3] = [
        ComparisonKind::LastQuarter,
        ComparisonKind::FirstQuarter,
        ComparisonKind::LastYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonKind::LastQuarter => "last-quarter",
            ComparisonKind::FirstQuarter => "first-quarter",
            ComparisonKind::LastYear => "last-year",
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonKind {
    type Err = QcmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComparisonKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                QcmrError::InvalidComparison(format!(
                    "unknown comparison '{}'. Valid: {}",
                    s,
                    ComparisonKind::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

/// One category in one month, from both reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    /// Calendar month, 1 = January.
    pub month: u32,
    /// 1 = July.
    pub fiscal_month: usize,
    pub current: f64,
    pub previous: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub kind: ComparisonKind,
    pub current_label: String,
    pub previous_label: String,
    /// Grouped by category, July through June within each.
    pub rows: Vec<ComparisonRow>,
}

/// Compare `tag` with the previous quarter's report (Q4 of the prior year for Q1).
pub fn to_last_quarter(series: &CashSeries, tag: ReportTag) -> Result<Comparison, QcmrError> {
    let previous = tag.previous();
    align(
        series,
        ComparisonKind::LastQuarter,
        (tag, tag.label()),
        (previous, previous.label()),
    )
}

/// Compare `tag` with the first quarter of the same fiscal year.
pub fn to_first_quarter(series: &CashSeries, tag: ReportTag) -> Result<Comparison, QcmrError> {
    if tag.quarter == 1 {
        return Err(QcmrError::InvalidComparison(format!(
            "{} is already the first quarter",
            tag.label()
        )));
    }
    let first = ReportTag::new(tag.fiscal_year, 1)?;
    align(
        series,
        ComparisonKind::FirstQuarter,
        (tag, tag.label()),
        (first, first.label()),
    )
}

/// Compare `tag` with the prior year's final (Q4) report.
pub fn to_last_year(series: &CashSeries, tag: ReportTag) -> Result<Comparison, QcmrError> {
    let last = ReportTag::new(tag.fiscal_year - 1, 4)?;
    align(
        series,
        ComparisonKind::LastYear,
        (tag, format!("FY{}", tag.year_abbreviation())),
        (last, format!("FY{}", last.year_abbreviation())),
    )
}

pub fn compare(
    series: &CashSeries,
    kind: ComparisonKind,
    tag: ReportTag,
) -> Result<Comparison, QcmrError> {
    match kind {
        ComparisonKind::LastQuarter => to_last_quarter(series, tag),
        ComparisonKind::FirstQuarter => to_first_quarter(series, tag),
        ComparisonKind::LastYear => to_last_year(series, tag),
    }
}

fn align(
    series: &CashSeries,
    kind: ComparisonKind,
    (current, current_label): (ReportTag, String),
    (previous, previous_label): (ReportTag, String),
) -> Result<Comparison, QcmrError> {
    for tag in [current, previous] {
        if !series.has_report(tag.fiscal_year, tag.quarter) {
            return Err(QcmrError::InvalidComparison(format!(
                "no processed data for {}",
                tag.label()
            )));
        }
    }

    let mut rows = Vec::new();
    for name in series.categories() {
        for fiscal in 0..12 {
            let month = calendar_month(fiscal);
            let value = |tag: ReportTag| {
                series
                    .record(tag.fiscal_year, tag.quarter, month)
                    .map(|r| r.value(&name))
                    .unwrap_or(f64::NAN)
            };
            rows.push(ComparisonRow {
                name: name.clone(),
                month,
                fiscal_month: fiscal + 1,
                current: value(current),
                previous: value(previous),
            });
        }
    }

    Ok(Comparison {
        kind,
        current_label,
        previous_label,
        rows,
    })
}

/// Calendar month closing each quarter.
fn quarter_end_month(quarter: u32) -> u32 {
    match quarter {
        1 => 9,
        2 => 12,
        3 => 3,
        _ => 6,
    }
}

/// Per fiscal year, category values for each report in use.
pub type YearTotals = BTreeMap<u32, BTreeMap<String, f64>>;

/// Is this record from the report in use for its fiscal year?
///
/// The current year uses `tag`'s projections; every other year uses its
/// final (Q4) actuals.
fn in_use(tag: ReportTag, fiscal_year: u32, quarter: u32) -> bool {
    if fiscal_year == tag.fiscal_year {
        quarter == tag.quarter
    } else {
        quarter == 4
    }
}

/// Balances at the close of `tag`'s quarter, for every fiscal year.
pub fn end_of_quarter_balances(series: &CashSeries, tag: ReportTag) -> YearTotals {
    let month = quarter_end_month(tag.quarter);
    series
        .records
        .iter()
        .filter(|r| in_use(tag, r.fiscal_year, r.quarter) && r.month == month)
        .map(|r| (r.fiscal_year, r.values.clone()))
        .collect()
}

/// Per fiscal year category totals over the months of `quarters`.
pub fn sum_over_quarters(
    series: &CashSeries,
    tag: ReportTag,
    quarters: &[u32],
) -> Result<YearTotals, QcmrError> {
    if quarters.is_empty() || quarters.iter().any(|q| !(1..=4).contains(q)) {
        return Err(QcmrError::InvalidComparison(format!(
            "quarters must be 1-4, got {quarters:?}"
        )));
    }

    let mut out = YearTotals::new();
    for record in &series.records {
        if !in_use(tag, record.fiscal_year, record.quarter) {
            continue;
        }
        let fiscal_quarter = (fiscal_index(record.month) / 3) as u32 + 1;
        if !quarters.contains(&fiscal_quarter) {
            continue;
        }
        accumulate(out.entry(record.fiscal_year).or_default(), record);
    }
    Ok(out)
}

/// Add a record's values into running totals.
///
/// Missing values are skipped; a category missing in every month stays `NaN`.
fn accumulate(totals: &mut BTreeMap<String, f64>, record: &CashRecord) {
    for (name, &value) in &record.values {
        let total = totals.entry(name.clone()).or_insert(f64::NAN);
        if value.is_nan() {
            continue;
        }
        *total = if total.is_nan() { value } else { *total + value };
    }
}

/// How a category's annual figure is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// The June balance.
    YearEndBalance,
    /// The sum over all twelve months.
    AnnualTotal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyRow {
    pub fiscal_year: u32,
    pub name: String,
    /// Q4 actual minus the projection made in the chosen quarter.
    pub difference: f64,
}

fn annual_figures(series: &CashSeries, quarter: u32, measure: Measure) -> YearTotals {
    let mut out = YearTotals::new();
    for record in series.records.iter().filter(|r| r.quarter == quarter) {
        if measure == Measure::YearEndBalance && record.month != 6 {
            continue;
        }
        accumulate(out.entry(record.fiscal_year).or_default(), record);
    }
    out
}

/// How far each year's projection from `quarter` landed from the Q4 actual.
///
/// Years lacking either report, or with a missing value, are left out.
pub fn annual_projection_accuracy(
    series: &CashSeries,
    quarter: u32,
    measure: Measure,
) -> Result<Vec<AccuracyRow>, QcmrError> {
    if !(1..=4).contains(&quarter) {
        return Err(QcmrError::InvalidTag(format!(
            "quarter must be 1-4, got {quarter}"
        )));
    }
    let actual = annual_figures(series, 4, measure);
    let projected = annual_figures(series, quarter, measure);

    let mut rows = Vec::new();
    for (year, actuals) in &actual {
        let Some(projections) = projected.get(year) else {
            continue;
        };
        for (name, a) in actuals {
            let Some(p) = projections.get(name) else {
                continue;
            };
            let difference = a - p;
            if !difference.is_nan() {
                rows.push(AccuracyRow {
                    fiscal_year: *year,
                    name: name.clone(),
                    difference,
                });
            }
        }
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.fiscal_year.cmp(&b.fiscal_year)));
    Ok(rows)
}

/// Totals whose first-quarter projection for FY2015 is hidden.
const MASKED_FY15_TOTALS: [&str; 2] = ["total_disbursements", "total_cash_receipts"];

/// Year-over-year change of one category, projected and actual.
///
/// Both changes are measured against the prior year's Q4 actual. Percent
/// changes are fractions of that base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRow {
    pub fiscal_year: u32,
    pub name: String,
    pub actual_change: f64,
    pub actual_change_percent: f64,
    pub projected_change: f64,
    pub projected_change_percent: f64,
}

/// Projected annual change from `quarter`'s report against the change that
/// actually happened.
///
/// A year appears once its `quarter` projection and the prior year's Q4
/// report both exist; the actual change is missing until its own Q4 report
/// is processed.
pub fn actual_vs_projected_changes(
    series: &CashSeries,
    quarter: u32,
) -> Result<Vec<ChangeRow>, QcmrError> {
    if !(1..=4).contains(&quarter) {
        return Err(QcmrError::InvalidTag(format!(
            "quarter must be 1-4, got {quarter}"
        )));
    }
    let actual = annual_figures(series, 4, Measure::AnnualTotal);
    let projected = annual_figures(series, quarter, Measure::AnnualTotal);

    let mut rows = Vec::new();
    for (&year, projections) in &projected {
        let Some(base) = actual.get(&(year - 1)) else {
            continue;
        };
        let outcome = actual.get(&year);
        for (name, &p) in projections {
            let prior = base.get(name).copied().unwrap_or(f64::NAN);
            let projected_change = p - prior;
            if projected_change.is_nan() {
                continue;
            }
            let a = outcome
                .and_then(|totals| totals.get(name))
                .copied()
                .unwrap_or(f64::NAN);
            let actual_change = a - prior;
            let mut row = ChangeRow {
                fiscal_year: year,
                name: name.clone(),
                actual_change,
                actual_change_percent: actual_change / prior,
                projected_change,
                projected_change_percent: projected_change / prior,
            };
            // the FY15 Q1 report predates the current total definitions
            if quarter == 1 && year == 2015 && MASKED_FY15_TOTALS.contains(&name.as_str()) {
                row.projected_change = f64::NAN;
                row.projected_change_percent = f64::NAN;
            }
            rows.push(row);
        }
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.fiscal_year.cmp(&b.fiscal_year)));
    Ok(rows)
}
