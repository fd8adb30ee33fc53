use crate::error::QcmrError;
use crate::model::{CanonicalRow, CanonicalTable};
use crate::report::Section;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "csv";

/// The named tables produced from one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBundle {
    pub title: String,
    tables: BTreeMap<String, CanonicalTable>,
}

impl TableBundle {
    pub fn new(title: impl Into<String>) -> Self {
        TableBundle {
            title: title.into(),
            tables: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, table: CanonicalTable) {
        self.tables.insert(name.into(), table);
    }

    /// Look up a table by section name.
    pub fn get(&self, name: &str) -> Result<&CanonicalTable, QcmrError> {
        self.tables.get(name).ok_or_else(|| QcmrError::UnknownSection {
            name: name.to_string(),
            valid: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    /// Look up a known section.
    pub fn section(&self, section: Section) -> Result<&CanonicalTable, QcmrError> {
        self.get(section.as_str())
    }

    /// Section names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CanonicalTable)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Write each table to `<dir>/<name>.csv`, creating `dir` if needed.
    ///
    /// Existing files are overwritten wholesale.
    pub fn write(&self, dir: &Path) -> Result<(), QcmrError> {
        fs::create_dir_all(dir)?;
        for (name, table) in &self.tables {
            let path = dir.join(format!("{name}.{EXTENSION}"));
            write_table(&path, table)?;
            debug!(path = %path.display(), rows = table.rows.len(), "wrote table");
        }
        Ok(())
    }

    /// Read every `.csv` file directly under `dir`.
    ///
    /// File stems become section names and the directory name the title.
    pub fn read(dir: &Path) -> Result<Self, QcmrError> {
        if !dir.is_dir() {
            return Err(QcmrError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not an existing directory", dir.display()),
            )));
        }
        let title = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == EXTENSION))
            .collect();
        paths.sort();

        let mut bundle = TableBundle::new(title);
        for path in paths {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let table = read_table(&path, &name)?;
            bundle.insert(name, table);
        }
        Ok(bundle)
    }
}

/// Write one table: header row, then one record per row; missing values are empty.
pub fn write_table(path: &Path, table: &CanonicalTable) -> Result<(), QcmrError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec![table.key_column.clone()];
    header.extend(table.columns.iter().cloned());
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.key.clone()];
        record.extend(row.values.iter().map(|v| {
            if v.is_nan() {
                String::new()
            } else {
                v.to_string()
            }
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a table written by [`write_table`].
pub fn read_table(path: &Path, section: &str) -> Result<CanonicalTable, QcmrError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut header_iter = headers.iter();
    let key_column = header_iter
        .next()
        .ok_or_else(|| QcmrError::MalformedTable {
            path: path.to_path_buf(),
            reason: "missing header row".into(),
        })?
        .to_string();
    let columns: Vec<String> = header_iter.map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let key = record.get(0).unwrap_or_default().to_string();
        let values = record
            .iter()
            .skip(1)
            .map(|field| parse_field(field, path))
            .collect::<Result<Vec<f64>, QcmrError>>()?;
        rows.push(CanonicalRow::new(key, values));
    }

    CanonicalTable::new(section, key_column, columns, rows)
}

fn parse_field(field: &str, path: &Path) -> Result<f64, QcmrError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|e| QcmrError::MalformedTable {
        path: path.to_path_buf(),
        reason: format!("invalid number '{}': {}", field, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> TableBundle {
        let mut bundle = TableBundle::new("Cash Flow Forecast");
        let mut payroll: Vec<f64> = (1..=12).map(|m| m as f64 * 100.25).collect();
        payroll[3] = f64::NAN;
        bundle.insert(
            "gf_spending",
            CanonicalTable::monthly(
                "gf_spending",
                vec![
                    CanonicalRow::new("payroll", payroll),
                    CanonicalRow::new("pension", vec![-0.1; 12]),
                ],
            )
            .unwrap(),
        );
        bundle.insert(
            "fund_balances",
            CanonicalTable::monthly(
                "fund_balances",
                vec![CanonicalRow::new("general_fund", vec![1e9 / 3.0; 12])],
            )
            .unwrap(),
        );
        bundle
    }

    #[test]
    fn test_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("Cash Flow Forecast");
        let original = bundle();
        original.write(&dir).unwrap();

        let loaded = TableBundle::read(&dir).unwrap();
        assert_eq!(loaded.title, "Cash Flow Forecast");
        assert_eq!(
            loaded.names().collect::<Vec<_>>(),
            vec!["fund_balances", "gf_spending"]
        );

        let spending = loaded.section(Section::GfSpending).unwrap();
        assert_eq!(spending.keys().collect::<Vec<_>>(), vec!["payroll", "pension"]);
        assert!(spending.value("payroll", "oct").unwrap().is_nan());
        assert_eq!(spending.value("payroll", "jul"), Some(100.25));
        assert_eq!(spending.value("pension", "jun"), Some(-0.1));
        assert_eq!(
            loaded.get("fund_balances").unwrap().value("general_fund", "jan"),
            Some(1e9 / 3.0)
        );
    }

    #[test]
    fn test_unknown_section() {
        let err = bundle().get("gf_revenue").unwrap_err();
        match err {
            QcmrError::UnknownSection { name, valid } => {
                assert_eq!(name, "gf_revenue");
                assert_eq!(valid, "fund_balances, gf_spending");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rewrite_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("bundle");
        bundle().write(&dir).unwrap();

        let mut smaller = TableBundle::new("bundle");
        smaller.insert(
            "gf_spending",
            CanonicalTable::monthly("gf_spending", vec![CanonicalRow::new("payroll", vec![0.0; 12])])
                .unwrap(),
        );
        smaller.write(&dir).unwrap();

        let loaded = TableBundle::read(&dir).unwrap();
        assert_eq!(loaded.get("gf_spending").unwrap().rows.len(), 1);
    }

    #[test]
    fn test_ignores_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        bundle().write(tmp.path()).unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a table").unwrap();
        assert_eq!(TableBundle::read(tmp.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(TableBundle::read(&tmp.path().join("absent")).is_err());
    }
}
