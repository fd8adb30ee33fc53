//! Turning detected string grids into typed, schema-conformant tables.

pub mod categories;
pub mod sanitize;
pub mod section;
pub mod values;

use crate::error::QcmrError;
use crate::model::{CanonicalRow, CanonicalTable, NumericGrid};

/// Build a table from a numeric grid, enforcing the expected value columns.
///
/// Extra trailing columns are only tolerated when `allow_trailing` is set; a
/// short row is always an error so monthly values are never shifted.
pub fn build_table(
    grid: NumericGrid,
    section: &str,
    key_column: &str,
    columns: Vec<String>,
    allow_trailing: bool,
) -> Result<CanonicalTable, QcmrError> {
    let expected = columns.len();
    let found = grid.n_value_columns();
    if found < expected || (found > expected && !allow_trailing) {
        return Err(QcmrError::ColumnCountMismatch {
            section: section.to_string(),
            expected,
            found,
        });
    }
    if found > expected {
        tracing::info!(
            section = %section,
            dropped = found - expected,
            "dropping trailing summary columns"
        );
    }

    let rows = grid
        .labels
        .into_iter()
        .zip(grid.values)
        .map(|(key, mut values)| {
            values.truncate(expected);
            CanonicalRow::new(key, values)
        })
        .collect();

    CanonicalTable::new(section, key_column, columns, rows)
}
