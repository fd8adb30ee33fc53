//! End-of-year fund balance revisions: how the final Q4 cash balance relates
//! to the audited figure published the following Q1.

use crate::error::QcmrError;
use crate::parsing::values::parse_currency;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const REVISIONS_FILE: &str = "end_of_year_fund_balance_revisions.xlsx";

const YEAR: &str = "Year";
const Q4_BALANCE: &str = "Q4 Cash Balance";
const Q1_ACTUAL: &str = "Q1 Actual";

/// Where the revisions spreadsheet lives under a data directory.
pub fn revisions_path(data_dir: &Path) -> PathBuf {
    data_dir.join("processed").join("other").join(REVISIONS_FILE)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionPoint {
    pub fiscal_year: u32,
    pub q4_cash_balance: f64,
    /// Missing until the year's audit is published.
    pub q1_actual: f64,
}

/// Ordinary least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevisionFit {
    pub intercept: f64,
    pub slope: f64,
    /// Points used in the fit.
    pub n: usize,
}

impl RevisionFit {
    pub fn predict(&self, q4_cash_balance: f64) -> f64 {
        self.intercept + self.slope * q4_cash_balance
    }
}

/// Fund balance revisions with the fitted line. Q1 actuals are in thousands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundBalanceRevisions {
    pub points: Vec<RevisionPoint>,
    pub fit: RevisionFit,
}

/// Load the revisions spreadsheet under `data_dir` and fit Q1 actuals
/// (scaled to thousands) against Q4 balances.
pub fn fund_balance_revisions(data_dir: &Path) -> Result<FundBalanceRevisions, QcmrError> {
    let mut points = load_fund_balance_revisions(&revisions_path(data_dir))?;
    for point in &mut points {
        point.q1_actual /= 1e3;
    }
    let fit = fit_revision_line(&points)?;
    Ok(FundBalanceRevisions { points, fit })
}

/// Read the first worksheet of the revisions spreadsheet.
pub fn load_fund_balance_revisions(path: &Path) -> Result<Vec<RevisionPoint>, QcmrError> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| QcmrError::Spreadsheet(format!("failed to open {}: {e}", path.display())))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| QcmrError::Spreadsheet(format!("{} has no worksheets", path.display())))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| QcmrError::Spreadsheet(format!("sheet '{sheet}' unreadable: {e}")))?;
    points_from_range(&range)
}

fn points_from_range(range: &Range<Data>) -> Result<Vec<RevisionPoint>, QcmrError> {
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| QcmrError::Spreadsheet(format!("missing column '{name}'")))
    };
    let (year, balance, actual) = (column(YEAR)?, column(Q4_BALANCE)?, column(Q1_ACTUAL)?);

    let mut points = Vec::new();
    for row in rows {
        let fiscal_year = cell_as_f64(row.get(year));
        // blank or note rows
        if !fiscal_year.is_finite() || fiscal_year < 0.0 {
            continue;
        }
        points.push(RevisionPoint {
            fiscal_year: fiscal_year as u32,
            q4_cash_balance: cell_as_f64(row.get(balance)),
            q1_actual: cell_as_f64(row.get(actual)),
        });
    }
    Ok(points)
}

fn cell_as_f64(cell: Option<&Data>) -> f64 {
    match cell {
        Some(Data::Float(f)) => *f,
        Some(Data::Int(i)) => *i as f64,
        Some(Data::String(s)) => parse_currency(s),
        _ => f64::NAN,
    }
}

/// Fit `q1_actual` against `q4_cash_balance`, skipping incomplete points.
pub fn fit_revision_line(points: &[RevisionPoint]) -> Result<RevisionFit, QcmrError> {
    let usable: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.q4_cash_balance.is_finite() && p.q1_actual.is_finite())
        .map(|p| (p.q4_cash_balance, p.q1_actual))
        .collect();
    let n = usable.len();
    if n < 2 {
        return Err(QcmrError::InvalidComparison(format!(
            "need at least 2 complete years to fit, found {n}"
        )));
    }

    let mean_x = usable.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let mean_y = usable.iter().map(|(_, y)| y).sum::<f64>() / n as f64;
    let sxx: f64 = usable.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = usable
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    if sxx == 0.0 {
        return Err(QcmrError::InvalidComparison(
            "every year has the same Q4 balance; the fit is undefined".into(),
        ));
    }

    let slope = sxy / sxx;
    Ok(RevisionFit {
        intercept: mean_y - slope * mean_x,
        slope,
        n,
    })
}
