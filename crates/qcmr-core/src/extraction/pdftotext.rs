use crate::error::QcmrError;
use crate::extraction::{PageContent, PdfExtractor};
use std::path::Path;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` to preserve whitespace alignment of tables.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    fn run(&self, pdf_path: &Path, range: Option<(usize, usize)>) -> Result<String, QcmrError> {
        let mut cmd = Command::new("pdftotext");
        cmd.arg("-layout");
        if let Some((first, last)) = range {
            // pdftotext pages are 1-based
            cmd.arg("-f")
                .arg((first + 1).to_string())
                .arg("-l")
                .arg((last + 1).to_string());
        }
        let output = cmd
            .arg(pdf_path)
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    QcmrError::PdftotextNotFound
                } else {
                    QcmrError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(QcmrError::PdftotextFailed { code, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<PageContent>, QcmrError> {
        let text = self.run(pdf_path, None)?;
        Ok(split_pages(&text, 0))
    }

    fn extract_page_range(
        &self,
        pdf_path: &Path,
        first: usize,
        last: usize,
    ) -> Result<Vec<PageContent>, QcmrError> {
        let text = self.run(pdf_path, Some((first, last)))?;
        Ok(split_pages(&text, first)
            .into_iter()
            .filter(|p| p.page_index <= last)
            .collect())
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split pdftotext output into pages (form feed \x0c is the page separator).
///
/// pdftotext terminates every page with a form feed, so the trailing empty
/// chunk is not a page.
fn split_pages(text: &str, first_index: usize) -> Vec<PageContent> {
    let mut chunks: Vec<&str> = text.split('\x0c').collect();
    if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
        chunks.pop();
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, page_text)| PageContent::new(first_index + i, page_text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_drops_trailing_feed() {
        let pages = split_pages("first page\n\x0csecond page\n\x0c", 0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines, vec!["first page"]);
        assert_eq!(pages[1].page_index, 1);
    }

    #[test]
    fn test_split_pages_offsets_index() {
        let pages = split_pages("a\x0cb\x0c", 4);
        assert_eq!(pages[0].page_index, 4);
        assert_eq!(pages[1].page_index, 5);
    }

    #[test]
    fn test_blank_page_kept() {
        let pages = split_pages("a\x0c\x0cc\x0c", 0);
        assert_eq!(pages.len(), 3);
        assert!(pages[1].lines.is_empty());
    }
}
