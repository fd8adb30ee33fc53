pub mod pdftotext;
pub mod table;

use crate::error::QcmrError;
use crate::model::RawGrid;
use std::path::Path;

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Zero-based page index within the document.
    pub page_index: usize,
    pub lines: Vec<String>,
}

impl PageContent {
    pub fn new(page_index: usize, text: &str) -> Self {
        PageContent {
            page_index,
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from a PDF, one PageContent per page.
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<PageContent>, QcmrError>;

    /// Extract the zero-based, inclusive page range `first..=last`.
    fn extract_page_range(
        &self,
        pdf_path: &Path,
        first: usize,
        last: usize,
    ) -> Result<Vec<PageContent>, QcmrError> {
        Ok(self
            .extract_pages(pdf_path)?
            .into_iter()
            .filter(|p| p.page_index >= first && p.page_index <= last)
            .collect())
    }

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// How aggressively detected text regions are merged into tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectMode {
    /// Runs of blank lines split a page into separate tables.
    #[default]
    Stream,
    /// Each page is a single table regardless of vertical gaps.
    Wide,
}

/// Trait for table detection backends.
pub trait TableDetector {
    /// Detect tables on the given zero-based pages, in page order.
    fn detect_tables(
        &self,
        pdf_path: &Path,
        pages: &[usize],
        mode: DetectMode,
    ) -> Result<Vec<RawGrid>, QcmrError>;
}
