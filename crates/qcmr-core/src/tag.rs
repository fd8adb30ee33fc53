use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::QcmrError;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"FY(?P<year>[0-9]{2})_Q(?P<quarter>[1-4])").expect("tag pattern is valid")
});

/// Identifies one quarterly report: `FY<yy>_Q<q>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReportTag {
    pub fiscal_year: u32,
    pub quarter: u32,
}

impl ReportTag {
    pub fn new(fiscal_year: u32, quarter: u32) -> Result<Self, QcmrError> {
        if !(1..=4).contains(&quarter) {
            return Err(QcmrError::InvalidTag(format!(
                "quarter must be 1-4, got {quarter}"
            )));
        }
        if !(2000..2100).contains(&fiscal_year) {
            return Err(QcmrError::InvalidTag(format!(
                "fiscal year must be a four-digit 20xx year, got {fiscal_year}"
            )));
        }
        Ok(ReportTag {
            fiscal_year,
            quarter,
        })
    }

    /// Last two digits of the fiscal year.
    pub fn year_abbreviation(&self) -> String {
        format!("{:02}", self.fiscal_year % 100)
    }

    /// The preceding report; Q1 rolls back to Q4 of the prior year.
    pub fn previous(&self) -> ReportTag {
        if self.quarter == 1 {
            ReportTag {
                fiscal_year: self.fiscal_year - 1,
                quarter: 4,
            }
        } else {
            ReportTag {
                fiscal_year: self.fiscal_year,
                quarter: self.quarter - 1,
            }
        }
    }

    /// Short label used in comparison column headers, e.g. `FY19 Q2`.
    pub fn label(&self) -> String {
        format!("FY{} Q{}", self.year_abbreviation(), self.quarter)
    }

    /// Source document path: `<data_dir>/raw/FY<yy>_Q<q>.pdf`.
    pub fn raw_pdf_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join("raw").join(format!("{self}.pdf"))
    }

    /// Output directory for this report: `<data_dir>/processed/FY<yy>_Q<q>`.
    pub fn processed_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join("processed").join(self.to_string())
    }

    /// Find a tag anywhere in a path or file name.
    pub fn find_in(text: &str) -> Option<ReportTag> {
        let caps = TAG_PATTERN.captures(text)?;
        let yy: u32 = caps.name("year")?.as_str().parse().ok()?;
        let quarter: u32 = caps.name("quarter")?.as_str().parse().ok()?;
        Some(ReportTag {
            fiscal_year: 2000 + yy,
            quarter,
        })
    }
}

impl fmt::Display for ReportTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FY{}_Q{}", self.year_abbreviation(), self.quarter)
    }
}

impl FromStr for ReportTag {
    type Err = QcmrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match ReportTag::find_in(s) {
            Some(tag) if tag.to_string() == s => Ok(tag),
            _ => Err(QcmrError::InvalidTag(format!(
                "'{s}' (expected FY<yy>_Q<1-4>)"
            ))),
        }
    }
}
