//! Leave Usage Analysis: quarter-only and year-to-date leave percentages
//! per department.

use super::{Bounds, Section, SectionPlan, ShapeContext};
use crate::error::QcmrError;
use crate::model::{CanonicalTable, RawGrid};
use crate::parsing::build_table;
use crate::parsing::sanitize::to_numeric_with;
use crate::parsing::values::parse_percent;

pub const LEAVE_COLUMNS: [&str; 3] = ["sickness_injury", "vacation_other", "total"];

pub(super) fn plan() -> Vec<SectionPlan> {
    [Section::QuarterOnly, Section::Ytd]
        .into_iter()
        .enumerate()
        .map(|(table, section)| SectionPlan {
            section,
            table,
            bounds: Bounds::After {
                start: &["Department"],
            },
            shape: shape_leave,
        })
        .collect()
}

fn shape_leave(
    mut grid: RawGrid,
    section: Section,
    _ctx: &ShapeContext<'_>,
) -> Result<CanonicalTable, QcmrError> {
    let name = section.as_str();
    grid.retain_rows(|row| row.iter().skip(1).any(|cell| !cell.trim().is_empty()));

    let mut numeric = to_numeric_with(&grid, parse_percent);
    numeric.drop_missing_rows();
    numeric.drop_incomplete_columns();
    if numeric.n_value_columns() < LEAVE_COLUMNS.len() {
        return Err(QcmrError::ColumnCountMismatch {
            section: name.to_string(),
            expected: LEAVE_COLUMNS.len(),
            found: numeric.n_value_columns(),
        });
    }

    for label in &mut numeric.labels {
        *label = label.replace(" - ", ": ");
    }

    let columns = LEAVE_COLUMNS.iter().map(|c| c.to_string()).collect();
    build_table(numeric, name, "department", columns, true)
}
