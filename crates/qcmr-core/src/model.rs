use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::QcmrError;

/// Fiscal month labels, July through June.
pub const FISCAL_MONTHS: [&str; 12] = [
    "jul", "aug", "sep", "oct", "nov", "dec", "jan", "feb", "mar", "apr", "may", "jun",
];

/// Calendar month number (1 = January) for a zero-based fiscal month index.
pub fn calendar_month(fiscal_index: usize) -> u32 {
    ((fiscal_index + 6) % 12) as u32 + 1
}

/// Zero-based fiscal month index for a calendar month number (1 = January).
pub fn fiscal_index(calendar_month: u32) -> usize {
    (calendar_month as usize + 5) % 12
}

/// A grid of strings as detected for one physical table region.
///
/// Rows are padded on construction so every row has the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        RawGrid { rows }
    }

    pub fn from_strs(rows: &[&[&str]]) -> Self {
        RawGrid::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The label cell of a row, or "" past the end.
    pub fn first_cell(&self, row: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.first())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(col).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Rows `start..end` as a new grid.
    pub fn slice_rows(&self, start: usize, end: usize) -> RawGrid {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        RawGrid {
            rows: self.rows[start..end].to_vec(),
        }
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|r| keep(r));
    }

    pub fn retain_columns(&mut self, keep: &[bool]) {
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(true);
                i += 1;
                k
            });
        }
    }

    pub fn map_column<F>(&mut self, col: usize, f: F)
    where
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(col) {
                *cell = f(cell);
            }
        }
    }

    /// Apply `f` to every cell outside the label column.
    pub fn map_values<F>(&mut self, f: F)
    where
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            for cell in row.iter_mut().skip(1) {
                *cell = f(cell);
            }
        }
    }
}

impl fmt::Display for RawGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", row.join(" | "))?;
        }
        Ok(())
    }
}

/// A grid whose label column is kept as text and whose other cells are numbers.
///
/// Missing values are `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericGrid {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl NumericGrid {
    pub fn n_value_columns(&self) -> usize {
        self.values.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Drop value columns in which every row is missing.
    pub fn drop_missing_columns(&mut self) {
        let width = self.n_value_columns();
        let keep: Vec<bool> = (0..width)
            .map(|c| self.values.iter().any(|r| !r[c].is_nan()))
            .collect();
        for row in &mut self.values {
            let mut i = 0;
            row.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }

    /// Drop value columns holding any missing value.
    pub fn drop_incomplete_columns(&mut self) {
        let width = self.n_value_columns();
        let keep: Vec<bool> = (0..width)
            .map(|c| self.values.iter().all(|r| !r[c].is_nan()))
            .collect();
        for row in &mut self.values {
            let mut i = 0;
            row.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
    }

    /// Drop rows in which every value is missing.
    pub fn drop_missing_rows(&mut self) {
        let mut labels = Vec::with_capacity(self.labels.len());
        let mut values = Vec::with_capacity(self.values.len());
        for (label, row) in self.labels.drain(..).zip(self.values.drain(..)) {
            if row.iter().any(|v| !v.is_nan()) {
                labels.push(label);
                values.push(row);
            }
        }
        self.labels = labels;
        self.values = values;
    }
}

/// One line item: a category key plus one value per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRow {
    pub key: String,
    pub values: Vec<f64>,
}

impl CanonicalRow {
    pub fn new(key: impl Into<String>, values: Vec<f64>) -> Self {
        CanonicalRow {
            key: key.into(),
            values,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| !v.is_nan())
    }
}

/// A normalized table: unique row keys, one shared column set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTable {
    pub key_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<CanonicalRow>,
}

impl CanonicalTable {
    /// Build a table, checking every row against the column set and key uniqueness.
    pub fn new(
        section: &str,
        key_column: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<CanonicalRow>,
    ) -> Result<Self, QcmrError> {
        let mut seen = HashSet::new();
        for row in &rows {
            if row.values.len() != columns.len() {
                return Err(QcmrError::ColumnCountMismatch {
                    section: section.to_string(),
                    expected: columns.len(),
                    found: row.values.len(),
                });
            }
            if !seen.insert(row.key.as_str()) {
                return Err(QcmrError::DuplicateCategory {
                    section: section.to_string(),
                    key: row.key.clone(),
                });
            }
        }
        Ok(CanonicalTable {
            key_column: key_column.into(),
            columns,
            rows,
        })
    }

    /// A `category` table over the twelve fiscal months.
    pub fn monthly(section: &str, rows: Vec<CanonicalRow>) -> Result<Self, QcmrError> {
        let columns = FISCAL_MONTHS.iter().map(|m| m.to_string()).collect();
        CanonicalTable::new(section, "category", columns, rows)
    }

    pub fn row(&self, key: &str) -> Option<&CanonicalRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.row(key).map(|r| r.values[col])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    /// `(row, column)` positions of every missing value.
    pub fn missing_cells(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (r, row) in self.rows.iter().enumerate() {
            for (c, v) in row.values.iter().enumerate() {
                if v.is_nan() {
                    out.push((r, c));
                }
            }
        }
        out
    }

    pub fn is_complete(&self) -> bool {
        self.rows.iter().all(|r| r.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_is_padded() {
        let grid = RawGrid::from_strs(&[&["a", "b", "c"], &["d"]]);
        assert_eq!(grid.n_cols(), 3);
        assert_eq!(grid.rows()[1], vec!["d", "", ""]);
    }

    #[test]
    fn test_fiscal_calendar_mapping() {
        assert_eq!(calendar_month(0), 7);
        assert_eq!(calendar_month(5), 12);
        assert_eq!(calendar_month(6), 1);
        assert_eq!(calendar_month(11), 6);
        for i in 0..12 {
            assert_eq!(fiscal_index(calendar_month(i)), i);
        }
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let rows = vec![
            CanonicalRow::new("payroll", vec![1.0; 12]),
            CanonicalRow::new("payroll", vec![2.0; 12]),
        ];
        let err = CanonicalTable::monthly("gf_spending", rows).unwrap_err();
        assert!(matches!(err, QcmrError::DuplicateCategory { .. }));
    }

    #[test]
    fn test_short_row_rejected() {
        let rows = vec![CanonicalRow::new("payroll", vec![1.0; 11])];
        let err = CanonicalTable::monthly("gf_spending", rows).unwrap_err();
        assert!(matches!(
            err,
            QcmrError::ColumnCountMismatch {
                expected: 12,
                found: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_drop_missing_rows_and_columns() {
        let mut grid = NumericGrid {
            labels: vec!["a".into(), "b".into()],
            values: vec![vec![1.0, f64::NAN, 2.0], vec![f64::NAN, f64::NAN, f64::NAN]],
        };
        grid.drop_missing_rows();
        grid.drop_missing_columns();
        assert_eq!(grid.labels, vec!["a"]);
        assert_eq!(grid.values, vec![vec![1.0, 2.0]]);
    }
}
