//! The report kinds found in a QCMR and how each is cut into sections.

pub mod assembler;
pub mod cash_forecast;
pub mod leave_usage;
pub mod obligations;

use crate::error::QcmrError;
use crate::extraction::DetectMode;
use crate::model::{CanonicalTable, RawGrid};
use crate::parsing::categories::UnmappedPolicy;
use crate::vocabulary::VocabularySet;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A logical report within the quarterly document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    LeaveUsage,
    CashForecast,
    GeneralFundObligations,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::LeaveUsage,
        ReportKind::CashForecast,
        ReportKind::GeneralFundObligations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::LeaveUsage => "leave_usage",
            ReportKind::CashForecast => "cash_forecast",
            ReportKind::GeneralFundObligations => "general_fund_obligations",
        }
    }

    /// Directory name of the persisted bundle.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::LeaveUsage => "Leave Usage Analysis",
            ReportKind::CashForecast => "Cash Flow Forecast",
            ReportKind::GeneralFundObligations => "General Fund Obligations",
        }
    }

    /// Phrases identifying the report's pages.
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            ReportKind::LeaveUsage => &["TOTAL LEAVE USAGE ANALYSIS"],
            ReportKind::CashForecast => &["CASH FLOW PROJECTIONS"],
            ReportKind::GeneralFundObligations => &["DEPARTMENTAL OBLIGATIONS SUMMARY"],
        }
    }

    pub fn detect_mode(&self) -> DetectMode {
        match self {
            // the cash forecast is one wide table per page
            ReportKind::CashForecast => DetectMode::Wide,
            ReportKind::LeaveUsage | ReportKind::GeneralFundObligations => DetectMode::Stream,
        }
    }

    /// Choose the pages to extract from the marker matches.
    pub fn select_pages(&self, found: &[usize]) -> Result<Vec<usize>, QcmrError> {
        let mismatch = |expected: &str| QcmrError::PageCountMismatch {
            section: self.as_str().to_string(),
            expected: expected.to_string(),
            found: found.to_vec(),
        };
        match self {
            ReportKind::CashForecast | ReportKind::GeneralFundObligations => {
                if found.len() != 2 {
                    return Err(mismatch("exactly 2"));
                }
                Ok(found.to_vec())
            }
            // the tables sit on the two pages after the second summary page
            ReportKind::LeaveUsage => {
                if found.len() < 2 {
                    return Err(mismatch("at least 2"));
                }
                Ok(vec![found[1], found[1] + 1])
            }
        }
    }

    /// The sections this report produces, in extraction order.
    pub fn plan(&self) -> Vec<SectionPlan> {
        match self {
            ReportKind::CashForecast => cash_forecast::plan(),
            ReportKind::LeaveUsage => leave_usage::plan(),
            ReportKind::GeneralFundObligations => obligations::plan(),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = QcmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| QcmrError::UnknownReport {
                name: s.to_string(),
                valid: ReportKind::ALL.map(|k| k.as_str()).join(", "),
            })
    }
}

/// A named table within a report bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    GfRevenue,
    GfSpending,
    GfBalanceSheet,
    FundBalances,
    QuarterOnly,
    Ytd,
    First,
    Second,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::GfRevenue,
        Section::GfSpending,
        Section::GfBalanceSheet,
        Section::FundBalances,
        Section::QuarterOnly,
        Section::Ytd,
        Section::First,
        Section::Second,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::GfRevenue => "gf_revenue",
            Section::GfSpending => "gf_spending",
            Section::GfBalanceSheet => "gf_balance_sheet",
            Section::FundBalances => "fund_balances",
            Section::QuarterOnly => "quarter_only",
            Section::Ytd => "ytd",
            Section::First => "first",
            Section::Second => "second",
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Section::GfRevenue
            | Section::GfSpending
            | Section::GfBalanceSheet
            | Section::FundBalances => ReportKind::CashForecast,
            Section::QuarterOnly | Section::Ytd => ReportKind::LeaveUsage,
            Section::First | Section::Second => ReportKind::GeneralFundObligations,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = QcmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|sec| sec.as_str() == s.trim())
            .ok_or_else(|| QcmrError::UnknownSection {
                name: s.to_string(),
                valid: Section::ALL.map(|sec| sec.as_str()).join(", "),
            })
    }
}

/// Which rows of a detected grid belong to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    /// After a start marker row through the end marker row.
    Between {
        start: &'static [&'static str],
        end: &'static str,
    },
    /// After a start marker row to the end of the grid.
    After { start: &'static [&'static str] },
    /// From a fixed row index to the end of the grid.
    FromRow(usize),
}

/// Shared inputs for turning a sanitized section grid into a table.
pub struct ShapeContext<'a> {
    pub vocabularies: &'a VocabularySet,
    pub policy: UnmappedPolicy,
}

/// Normalizes a sanitized section grid into a canonical table.
pub type Shaper = fn(RawGrid, Section, &ShapeContext<'_>) -> Result<CanonicalTable, QcmrError>;

/// How one section is cut from the detected tables and shaped.
#[derive(Clone, Copy)]
pub struct SectionPlan {
    pub section: Section,
    /// Index into the tables detected on the report's pages.
    pub table: usize,
    pub bounds: Bounds,
    pub shape: Shaper,
}

impl fmt::Debug for SectionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionPlan")
            .field("section", &self.section)
            .field("table", &self.table)
            .field("bounds", &self.bounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_needs_two_pages() {
        assert_eq!(ReportKind::CashForecast.select_pages(&[40, 41]).unwrap(), vec![40, 41]);
        assert!(matches!(
            ReportKind::CashForecast.select_pages(&[40]),
            Err(QcmrError::PageCountMismatch { .. })
        ));
        assert!(ReportKind::CashForecast.select_pages(&[]).is_err());
    }

    #[test]
    fn test_leave_usage_uses_pages_after_second_match() {
        assert_eq!(
            ReportKind::LeaveUsage.select_pages(&[10, 12, 20]).unwrap(),
            vec![12, 13]
        );
        assert!(ReportKind::LeaveUsage.select_pages(&[10]).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("cash-forecast".parse::<ReportKind>().unwrap(), ReportKind::CashForecast);
        assert!(matches!(
            "budget".parse::<ReportKind>(),
            Err(QcmrError::UnknownReport { .. })
        ));
        assert_eq!("gf_revenue".parse::<Section>().unwrap(), Section::GfRevenue);
        assert!(matches!(
            "gf_revenues".parse::<Section>(),
            Err(QcmrError::UnknownSection { .. })
        ));
    }

    #[test]
    fn test_plans_cover_sections() {
        for kind in ReportKind::ALL {
            for plan in kind.plan() {
                assert_eq!(plan.section.kind(), kind);
            }
        }
        assert_eq!(ReportKind::CashForecast.plan().len(), 4);
    }
}
