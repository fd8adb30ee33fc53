use crate::error::QcmrError;
use crate::extraction::{PageContent, PdfExtractor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// How the marker phrases of one section are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every phrase must appear on the page.
    #[default]
    All,
    /// Any one phrase is enough.
    Any,
}

/// Does this page text contain the markers under `mode`?
pub fn page_matches(text: &str, phrases: &[String], mode: MatchMode) -> bool {
    match mode {
        MatchMode::All => phrases.iter().all(|p| text.contains(p.as_str())),
        MatchMode::Any => phrases.iter().any(|p| text.contains(p.as_str())),
    }
}

/// Zero-based indices of the pages matching each section's markers.
///
/// A section that matches nothing maps to an empty list; callers decide
/// whether that is fatal.
pub fn locate(
    pages: &[PageContent],
    markers: &BTreeMap<String, Vec<String>>,
    mode: MatchMode,
) -> BTreeMap<String, Vec<usize>> {
    let texts: Vec<(usize, String)> = pages
        .iter()
        .map(|p| (p.page_index, p.lines.join("\n")))
        .collect();

    markers
        .iter()
        .map(|(section, phrases)| {
            let found: Vec<usize> = texts
                .iter()
                .filter(|(_, text)| page_matches(text, phrases, mode))
                .map(|(i, _)| *i)
                .collect();
            debug!(section = %section, pages = ?found, "located section pages");
            (section.clone(), found)
        })
        .collect()
}

/// Extract every page of `pdf_path` and locate the sections in it.
pub fn locate_in_document(
    extractor: &dyn PdfExtractor,
    pdf_path: &Path,
    markers: &BTreeMap<String, Vec<String>>,
    mode: MatchMode,
) -> Result<BTreeMap<String, Vec<usize>>, QcmrError> {
    let pages = extractor.extract_pages(pdf_path)?;
    Ok(locate(&pages, markers, mode))
}
