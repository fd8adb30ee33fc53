//! Cash Flow Forecast: general fund revenue, spending and balance sheet on
//! the first page, fund balances across all funds on the second.

use super::{Bounds, Section, SectionPlan, ShapeContext};
use crate::error::QcmrError;
use crate::model::{CanonicalTable, RawGrid, FISCAL_MONTHS};
use crate::parsing::build_table;
use crate::parsing::categories::{normalize, normalize_numeric};
use crate::parsing::sanitize::{blanks_as_zero, remove_empty_columns, to_numeric};

pub(super) fn plan() -> Vec<SectionPlan> {
    vec![
        SectionPlan {
            section: Section::GfRevenue,
            table: 0,
            bounds: Bounds::Between {
                start: &["REVENUES"],
                end: "TOTAL CASH RECEIPTS",
            },
            shape: shape_flows,
        },
        SectionPlan {
            section: Section::GfSpending,
            table: 0,
            bounds: Bounds::Between {
                start: &["EXPENSES AND OBLIGATIONS"],
                end: "TOTAL DISBURSEMENTS",
            },
            shape: shape_flows,
        },
        SectionPlan {
            section: Section::GfBalanceSheet,
            table: 0,
            bounds: Bounds::After {
                start: &["TOTAL DISBURSEMENTS"],
            },
            shape: shape_balance_sheet,
        },
        SectionPlan {
            section: Section::FundBalances,
            table: 1,
            bounds: Bounds::FromRow(2),
            shape: shape_fund_balances,
        },
    ]
}

fn months() -> Vec<String> {
    FISCAL_MONTHS.iter().map(|m| m.to_string()).collect()
}

/// Revenue and spending carry summary columns after June.
fn shape_flows(
    grid: RawGrid,
    section: Section,
    ctx: &ShapeContext<'_>,
) -> Result<CanonicalTable, QcmrError> {
    shape_general_fund(grid, section, ctx, true)
}

fn shape_balance_sheet(
    grid: RawGrid,
    section: Section,
    ctx: &ShapeContext<'_>,
) -> Result<CanonicalTable, QcmrError> {
    shape_general_fund(grid, section, ctx, false)
}

fn shape_general_fund(
    grid: RawGrid,
    section: Section,
    ctx: &ShapeContext<'_>,
    allow_trailing: bool,
) -> Result<CanonicalTable, QcmrError> {
    let name = section.as_str();
    let vocabulary = ctx.vocabularies.get(name)?;
    let normalized = normalize(grid, vocabulary, ctx.policy, name)?;
    let grid = blanks_as_zero(remove_empty_columns(normalized.grid));
    build_table(to_numeric(&grid), name, "category", months(), allow_trailing)
}

/// Blank fund balance cells stay missing and are gap-filled later.
fn shape_fund_balances(
    grid: RawGrid,
    section: Section,
    ctx: &ShapeContext<'_>,
) -> Result<CanonicalTable, QcmrError> {
    let name = section.as_str();
    let mut numeric = to_numeric(&remove_empty_columns(grid));
    numeric.drop_missing_columns();
    numeric.drop_missing_rows();

    let vocabulary = ctx.vocabularies.get(name)?;
    let normalized = normalize_numeric(numeric, vocabulary, ctx.policy, name)?;
    build_table(normalized.grid, name, "category", months(), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::categories::UnmappedPolicy;
    use crate::vocabulary::VocabularySet;

    fn ctx(vocabularies: &VocabularySet) -> ShapeContext<'_> {
        ShapeContext {
            vocabularies,
            policy: UnmappedPolicy::WarnAndDrop,
        }
    }

    fn month_row(label: &str, first: &str, rest: &str) -> Vec<String> {
        let mut row = vec![label.to_string(), first.to_string()];
        row.extend(std::iter::repeat(rest.to_string()).take(11));
        row
    }

    #[test]
    fn test_flows_drop_summary_columns() {
        let vocabularies = VocabularySet::builtin().unwrap();
        let mut row = month_row("Payroll", "$100", "$10");
        row.push("$210".into());
        row.push("$999".into());
        let grid = RawGrid::new(vec![row]);
        let table = shape_flows(grid, Section::GfSpending, &ctx(&vocabularies)).unwrap();
        assert_eq!(table.columns.len(), 12);
        assert_eq!(table.value("payroll", "jul"), Some(100.0));
        assert_eq!(table.value("payroll", "jun"), Some(10.0));
    }

    #[test]
    fn test_blank_general_fund_cells_are_zero() {
        let vocabularies = VocabularySet::builtin().unwrap();
        let grid = RawGrid::new(vec![
            month_row("TRAN", "", "$1"),
            month_row("CLOSING BALANCE", "$5", "$6"),
        ]);
        let table =
            shape_balance_sheet(grid, Section::GfBalanceSheet, &ctx(&vocabularies)).unwrap();
        assert_eq!(table.value("tran", "jul"), Some(0.0));
        assert!(table.is_complete());
    }

    #[test]
    fn test_balance_sheet_is_strict() {
        let vocabularies = VocabularySet::builtin().unwrap();
        let mut row = month_row("TRAN", "$1", "$1");
        row.push("$13".into());
        let err = shape_balance_sheet(
            RawGrid::new(vec![row]),
            Section::GfBalanceSheet,
            &ctx(&vocabularies),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QcmrError::ColumnCountMismatch {
                expected: 12,
                found: 13,
                ..
            }
        ));
    }

    #[test]
    fn test_fund_balances_keep_missing_cells() {
        let vocabularies = VocabularySet::builtin().unwrap();
        let mut general = month_row("General", "$1", "$2");
        general[3] = "N/A".into();
        let grid = RawGrid::new(vec![
            month_row("Fund", "", ""),
            vec![String::new(); 13],
            general,
            month_row("Other Funds", "(5)", "$7"),
        ]);
        let table =
            shape_fund_balances(grid, Section::FundBalances, &ctx(&vocabularies)).unwrap();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["general_fund", "other_funds"]);
        assert!(table.value("general_fund", "sep").unwrap().is_nan());
        assert_eq!(table.value("other_funds", "jul"), Some(-5.0));
    }

    #[test]
    fn test_unrecognized_category_dropped() {
        let vocabularies = VocabularySet::builtin().unwrap();
        let grid = RawGrid::new(vec![
            month_row("Real Estate Tax", "$1", "$1"),
            month_row("Lottery", "$9", "$9"),
        ]);
        let table = shape_flows(grid, Section::GfRevenue, &ctx(&vocabularies)).unwrap();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["real_estate_tax"]);
    }
}
