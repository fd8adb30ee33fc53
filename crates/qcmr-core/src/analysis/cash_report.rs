use super::compare::{
    actual_vs_projected_changes, annual_projection_accuracy, compare, AccuracyRow, ChangeRow,
    Comparison, ComparisonKind, Measure,
};
use super::revisions::{fund_balance_revisions, FundBalanceRevisions};
use super::series::{display_name, load_cash_series, CashSeries};
use crate::error::QcmrError;
use crate::report::Section;
use crate::tag::ReportTag;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// The cash series a report compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CashKind {
    Spending,
    Revenue,
    #[serde(rename = "Fund Balance")]
    FundBalance,
}

impl CashKind {
    pub const ALL: [CashKind; 3] = [CashKind::Spending, CashKind::Revenue, CashKind::FundBalance];

    pub fn label(&self) -> &'static str {
        match self {
            CashKind::Spending => "Spending",
            CashKind::Revenue => "Revenue",
            CashKind::FundBalance => "Fund Balance",
        }
    }

    pub fn section(&self) -> Section {
        match self {
            CashKind::Spending => Section::GfSpending,
            CashKind::Revenue => Section::GfRevenue,
            CashKind::FundBalance => Section::FundBalances,
        }
    }

    pub fn measure(&self) -> Measure {
        match self {
            CashKind::FundBalance => Measure::YearEndBalance,
            CashKind::Spending | CashKind::Revenue => Measure::AnnualTotal,
        }
    }
}

impl fmt::Display for CashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CashKind {
    type Err = QcmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "spending" => Ok(CashKind::Spending),
            "revenue" => Ok(CashKind::Revenue),
            "fund-balance" => Ok(CashKind::FundBalance),
            _ => Err(QcmrError::InvalidComparison(format!(
                "unknown cash series '{s}'. Valid: spending, revenue, fund-balance"
            ))),
        }
    }
}

/// A comparison over one cash series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindComparison {
    #[serde(rename = "series")]
    pub kind: CashKind,
    #[serde(flatten)]
    pub comparison: Comparison,
}

/// Projected against actual annual changes for one cash series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindChanges {
    #[serde(rename = "series")]
    pub kind: CashKind,
    pub rows: Vec<ChangeRow>,
}

/// Keep the rows of reported categories, renamed for display.
fn with_display_names<T>(
    section: Section,
    rows: Vec<T>,
    name: fn(&mut T) -> &mut String,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|mut row| {
            let shown = display_name(section, name(&mut row))?;
            *name(&mut row) = shown.to_string();
            Some(row)
        })
        .collect()
}

/// Accuracy of the annual projections made in `quarter`, by display name.
pub fn projection_accuracy(
    data_dir: &Path,
    kind: CashKind,
    quarter: u32,
) -> Result<Vec<AccuracyRow>, QcmrError> {
    let series = load_cash_series(data_dir, kind.section())?;
    let rows = annual_projection_accuracy(&series, quarter, kind.measure())?;
    Ok(with_display_names(kind.section(), rows, |r| &mut r.name))
}

/// Projected against actual annual changes for revenue and spending.
pub fn projected_changes(data_dir: &Path, quarter: u32) -> Result<Vec<KindChanges>, QcmrError> {
    [CashKind::Revenue, CashKind::Spending]
        .into_iter()
        .map(|kind| {
            let series = load_cash_series(data_dir, kind.section())?;
            let rows = actual_vs_projected_changes(&series, quarter)?;
            debug!(series = %kind, rows = rows.len(), "annual changes");
            Ok(KindChanges {
                kind,
                rows: with_display_names(kind.section(), rows, |r| &mut r.name),
            })
        })
        .collect()
}

/// Analysis of the cash flow forecasts as of one quarterly report.
#[derive(Debug, Clone)]
pub struct CashReport {
    data_dir: PathBuf,
    tag: ReportTag,
}

impl CashReport {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        fiscal_year: u32,
        quarter: u32,
    ) -> Result<Self, QcmrError> {
        Ok(CashReport {
            data_dir: data_dir.into(),
            tag: ReportTag::new(fiscal_year, quarter)?,
        })
    }

    pub fn tag(&self) -> ReportTag {
        self.tag
    }

    pub fn series(&self, kind: CashKind) -> Result<CashSeries, QcmrError> {
        load_cash_series(&self.data_dir, kind.section())
    }

    /// Run one comparison over spending, revenue and fund balances.
    pub fn compare(&self, kind: ComparisonKind) -> Result<Vec<KindComparison>, QcmrError> {
        CashKind::ALL
            .into_iter()
            .map(|cash| {
                let series = self.series(cash)?;
                debug!(series = %cash, comparison = %kind, "comparing");
                let mut comparison = compare(&series, kind, self.tag)?;
                comparison.rows =
                    with_display_names(cash.section(), comparison.rows, |r| &mut r.name);
                Ok(KindComparison {
                    kind: cash,
                    comparison,
                })
            })
            .collect()
    }

    pub fn compare_to_last_quarter(&self) -> Result<Vec<KindComparison>, QcmrError> {
        self.compare(ComparisonKind::LastQuarter)
    }

    pub fn compare_to_first_quarter(&self) -> Result<Vec<KindComparison>, QcmrError> {
        self.compare(ComparisonKind::FirstQuarter)
    }

    pub fn compare_to_last_year(&self) -> Result<Vec<KindComparison>, QcmrError> {
        self.compare(ComparisonKind::LastYear)
    }

    /// Historical accuracy of the annual projections made in this report's quarter.
    pub fn annual_projection_accuracy(
        &self,
        kind: CashKind,
    ) -> Result<Vec<AccuracyRow>, QcmrError> {
        projection_accuracy(&self.data_dir, kind, self.tag.quarter)
    }

    /// Projected annual changes from this report's quarter against the actual ones.
    pub fn actual_vs_projected_changes(&self) -> Result<Vec<KindChanges>, QcmrError> {
        projected_changes(&self.data_dir, self.tag.quarter)
    }

    pub fn fund_balance_revisions(&self) -> Result<FundBalanceRevisions, QcmrError> {
        fund_balance_revisions(&self.data_dir)
    }
}
