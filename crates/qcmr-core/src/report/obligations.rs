//! General Fund Obligations: departmental obligations summary, split over
//! two pages.

use super::{Bounds, Section, SectionPlan, ShapeContext};
use crate::error::QcmrError;
use crate::model::{CanonicalTable, RawGrid};
use crate::parsing::build_table;
use crate::parsing::sanitize::to_numeric;

/// Rows holding the column headings, which wrap over several lines.
const HEADER_ROWS: std::ops::Range<usize> = 2..5;

pub(super) fn plan() -> Vec<SectionPlan> {
    [Section::First, Section::Second]
        .into_iter()
        .enumerate()
        .map(|(table, section)| SectionPlan {
            section,
            table,
            bounds: Bounds::FromRow(0),
            shape: shape_obligations,
        })
        .collect()
}

/// Join the wrapped heading lines of each column.
fn header_names(grid: &RawGrid) -> Vec<String> {
    let header = grid.slice_rows(HEADER_ROWS.start, HEADER_ROWS.end);
    (0..header.n_cols())
        .map(|c| {
            header
                .column(c)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|name| !name.is_empty())
        .collect()
}

fn shape_obligations(
    grid: RawGrid,
    section: Section,
    _ctx: &ShapeContext<'_>,
) -> Result<CanonicalTable, QcmrError> {
    let name = section.as_str();
    let names = header_names(&grid);

    let mut data = grid.slice_rows(HEADER_ROWS.end, grid.n_rows());
    let keep: Vec<bool> = (0..data.n_cols())
        .map(|c| data.column(c).any(|cell| !cell.trim().is_empty()))
        .collect();
    data.retain_columns(&keep);
    data.retain_rows(|row| row.iter().all(|cell| !cell.trim().is_empty()));

    let found = data.n_cols();
    if names.len() != found || names.is_empty() {
        return Err(QcmrError::ColumnCountMismatch {
            section: name.to_string(),
            expected: names.len(),
            found,
        });
    }

    let mut names = names.into_iter();
    let key_column = names.next().unwrap_or_default();
    build_table(to_numeric(&data), name, &key_column, names.collect(), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::categories::UnmappedPolicy;
    use crate::vocabulary::VocabularySet;

    fn shape(grid: RawGrid) -> Result<CanonicalTable, QcmrError> {
        let vocabularies = VocabularySet::builtin().unwrap();
        let ctx = ShapeContext {
            vocabularies: &vocabularies,
            policy: UnmappedPolicy::WarnAndDrop,
        };
        shape_obligations(grid, Section::First, &ctx)
    }

    fn page() -> RawGrid {
        RawGrid::from_strs(&[
            &["DEPARTMENTAL OBLIGATIONS SUMMARY", "", "", ""],
            &["", "", "", ""],
            &["", "FY20", "", "Target"],
            &["Department", "Adopted", "", "Budget"],
            &["", "Budget", "", ""],
            &["Police", "$700,000", "", "$710,000"],
            &["Fire", "$300,000", "", "$305,000"],
            &["Subtotal", "", "", "$1,015,000"],
        ])
    }

    #[test]
    fn test_headers_and_rows() {
        let table = shape(page()).unwrap();
        assert_eq!(table.key_column, "Department");
        assert_eq!(table.columns, vec!["FY20 Adopted Budget", "Target Budget"]);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["Police", "Fire"]);
        assert_eq!(table.value("Fire", "Target Budget"), Some(305000.0));
    }

    #[test]
    fn test_header_count_mismatch() {
        let mut rows: Vec<Vec<String>> = page().into_rows();
        rows[2][2] = "Extra".into();
        assert!(matches!(
            shape(RawGrid::new(rows)),
            Err(QcmrError::ColumnCountMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }
}
