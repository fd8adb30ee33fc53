use crate::error::QcmrError;
use crate::extraction::{DetectMode, PageContent, PdfExtractor, TableDetector};
use crate::model::RawGrid;
use std::path::Path;
use tracing::debug;

/// Reconstruct table grids from `pdftotext -layout` output.
///
/// pdftotext -layout preserves column alignment using spaces, so columns
/// are recovered from character positions that stay blank across the
/// multi-field lines of a region.
pub struct LayoutTableDetector<E: PdfExtractor> {
    extractor: E,
}

impl<E: PdfExtractor> LayoutTableDetector<E> {
    pub fn new(extractor: E) -> Self {
        LayoutTableDetector { extractor }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }
}

impl<E: PdfExtractor> TableDetector for LayoutTableDetector<E> {
    fn detect_tables(
        &self,
        pdf_path: &Path,
        pages: &[usize],
        mode: DetectMode,
    ) -> Result<Vec<RawGrid>, QcmrError> {
        let (Some(&first), Some(&last)) = (pages.iter().min(), pages.iter().max()) else {
            return Ok(Vec::new());
        };
        let content = self.extractor.extract_page_range(pdf_path, first, last)?;

        let mut grids = Vec::new();
        for &index in pages {
            let Some(page) = content.iter().find(|p| p.page_index == index) else {
                return Err(QcmrError::Extraction(format!(
                    "page {} not present in {}",
                    index,
                    pdf_path.display()
                )));
            };
            let found = detect_page_tables(page, mode);
            debug!(page = index, tables = found.len(), "detected tables");
            grids.extend(found);
        }
        Ok(grids)
    }
}

/// Detect the tables on one page.
pub fn detect_page_tables(page: &PageContent, mode: DetectMode) -> Vec<RawGrid> {
    split_regions(&page.lines, mode)
        .into_iter()
        .map(|region| infer_grid(&region))
        .filter(|grid| !grid.is_empty())
        .collect()
}

/// Group the non-blank lines of a page into table regions.
fn split_regions(lines: &[String], mode: DetectMode) -> Vec<Vec<&str>> {
    let mut regions = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut blank_run = 0;

    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if mode == DetectMode::Stream && blank_run == 2 && !current.is_empty() {
                regions.push(std::mem::take(&mut current));
            }
            continue;
        }
        blank_run = 0;
        current.push(line.as_str());
    }
    if !current.is_empty() {
        regions.push(current);
    }

    // a region without any multi-field line is a title or footnote
    regions
        .into_iter()
        .filter(|r| r.iter().any(|l| segments(l).len() >= 2))
        .collect()
}

/// A run of text separated from its neighbours by 2+ whitespace characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Character (not byte) offset of the first character.
    pub start: usize,
    /// Character offset one past the last non-whitespace character.
    pub end: usize,
    pub text: String,
}

/// Split a line by gaps of 2+ whitespace characters.
pub fn segments(line: &str) -> Vec<Segment> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i + 1;
        let mut j = i + 1;
        while j < chars.len() {
            if chars[j].is_whitespace() {
                let mut k = j;
                while k < chars.len() && chars[k].is_whitespace() {
                    k += 1;
                }
                if k - j >= 2 || k == chars.len() {
                    break;
                }
                j = k;
            } else {
                j += 1;
                end = j;
            }
        }
        out.push(Segment {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });
        i = end;
    }

    out
}

/// Build a grid from the lines of one table region.
pub fn infer_grid(lines: &[&str]) -> RawGrid {
    let segmented: Vec<Vec<Segment>> = lines
        .iter()
        .map(|l| segments(l))
        .filter(|s| !s.is_empty())
        .collect();
    if segmented.is_empty() {
        return RawGrid::default();
    }

    let width = segmented
        .iter()
        .flat_map(|s| s.iter().map(|seg| seg.end))
        .max()
        .unwrap_or(0);
    let mut occupied = vec![false; width];
    for segs in segmented.iter().filter(|s| s.len() >= 2) {
        for seg in segs {
            occupied[seg.start..seg.end].iter_mut().for_each(|o| *o = true);
        }
    }

    let spans = column_spans(&occupied);
    if spans.is_empty() {
        // single-field lines only: one column
        return RawGrid::new(
            segmented
                .iter()
                .map(|segs| vec![join_texts(segs.iter().map(|s| s.text.as_str()))])
                .collect(),
        );
    }

    let rows = segmented
        .iter()
        .map(|segs| {
            let mut row = vec![String::new(); spans.len()];
            for seg in segs {
                let col = column_for(&spans, seg.start);
                if row[col].is_empty() {
                    row[col] = seg.text.clone();
                } else {
                    row[col].push(' ');
                    row[col].push_str(&seg.text);
                }
            }
            row
        })
        .collect();

    RawGrid::new(rows)
}

/// Maximal runs of occupied positions, as `(start, end)` pairs.
fn column_spans(occupied: &[bool]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, &o) in occupied.iter().enumerate() {
        match (o, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, occupied.len()));
    }
    spans
}

/// The span containing `pos`, else the next span to its right, else the last.
fn column_for(spans: &[(usize, usize)], pos: usize) -> usize {
    spans
        .iter()
        .position(|&(_, end)| pos < end)
        .unwrap_or(spans.len() - 1)
}

fn join_texts<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}
