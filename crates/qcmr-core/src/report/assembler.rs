use super::{Bounds, ReportKind, SectionPlan, ShapeContext};
use crate::bundle::TableBundle;
use crate::config::AssemblerConfig;
use crate::error::QcmrError;
use crate::extraction::{PdfExtractor, TableDetector};
use crate::fill::{fill_missing, MissingValueSource};
use crate::locate::{locate_in_document, MatchMode};
use crate::model::RawGrid;
use crate::parsing::categories::UnmappedPolicy;
use crate::parsing::sanitize::{sanitize, sanitize_labels};
use crate::parsing::section::{extract_after, extract_section};
use crate::tag::ReportTag;
use crate::vocabulary::VocabularySet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Progress of one report through the pipeline. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssemblyStage {
    NotStarted,
    PagesLocated,
    SectionsExtracted,
    Sanitized,
    CategoriesNormalized,
    GapFilled,
    Persisted,
}

struct Progress {
    kind: ReportKind,
    stage: AssemblyStage,
}

impl Progress {
    fn new(kind: ReportKind) -> Self {
        Progress {
            kind,
            stage: AssemblyStage::NotStarted,
        }
    }

    fn advance(&mut self, next: AssemblyStage) {
        debug_assert!(next >= self.stage);
        self.stage = next;
        debug!(report = %self.kind, stage = ?next, "assembly stage");
    }
}

/// A bundle produced by [`ReportAssembler::process`].
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedReport {
    pub kind: ReportKind,
    pub bundle: TableBundle,
    /// Loaded from an existing output directory rather than extracted.
    pub cached: bool,
    pub dir: PathBuf,
}

/// Turns one quarterly PDF into persisted table bundles.
pub struct ReportAssembler<'a> {
    data_dir: PathBuf,
    policy: UnmappedPolicy,
    vocabularies: VocabularySet,
    extractor: &'a dyn PdfExtractor,
    detector: &'a dyn TableDetector,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        config: &AssemblerConfig,
        extractor: &'a dyn PdfExtractor,
        detector: &'a dyn TableDetector,
    ) -> Result<Self, QcmrError> {
        Ok(ReportAssembler {
            data_dir: config.data_dir.clone(),
            policy: config.unmapped,
            vocabularies: config.vocabulary_set()?,
            extractor,
            detector,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the raw PDF for `tag`, which must exist.
    pub fn document(&self, tag: ReportTag) -> Result<PathBuf, QcmrError> {
        let path = tag.raw_pdf_path(&self.data_dir);
        if !path.is_file() {
            return Err(QcmrError::DocumentNotFound {
                tag: tag.to_string(),
                path,
            });
        }
        Ok(path)
    }

    /// Pages matching each report kind's markers.
    pub fn locate_pages(
        &self,
        tag: ReportTag,
    ) -> Result<BTreeMap<ReportKind, Vec<usize>>, QcmrError> {
        let path = self.document(tag)?;
        let markers: BTreeMap<String, Vec<String>> = ReportKind::ALL
            .iter()
            .map(|k| {
                let phrases = k.markers().iter().map(|m| m.to_string()).collect();
                (k.as_str().to_string(), phrases)
            })
            .collect();
        debug!(backend = self.extractor.backend_name(), path = %path.display(), "locating report pages");
        let found = locate_in_document(self.extractor, &path, &markers, MatchMode::All)?;

        Ok(ReportKind::ALL
            .into_iter()
            .map(|k| (k, found.get(k.as_str()).cloned().unwrap_or_default()))
            .collect())
    }

    /// Extract and normalize every section of one report.
    ///
    /// `found` is the marker match list for the kind. Nothing is written.
    pub fn assemble(
        &self,
        tag: ReportTag,
        kind: ReportKind,
        found: &[usize],
        source: &mut dyn MissingValueSource,
    ) -> Result<TableBundle, QcmrError> {
        let mut progress = Progress::new(kind);
        let path = self.document(tag)?;

        let pages = kind.select_pages(found)?;
        progress.advance(AssemblyStage::PagesLocated);

        // markers are matched against cleaned labels
        let tables: Vec<RawGrid> = self
            .detector
            .detect_tables(&path, &pages, kind.detect_mode())?
            .into_iter()
            .map(sanitize_labels)
            .collect();
        let plans = kind.plan();
        let mut grids = Vec::with_capacity(plans.len());
        for plan in &plans {
            grids.push(cut_section(&tables, plan)?);
        }
        progress.advance(AssemblyStage::SectionsExtracted);

        let grids: Vec<RawGrid> = grids.into_iter().map(sanitize).collect();
        progress.advance(AssemblyStage::Sanitized);

        let ctx = ShapeContext {
            vocabularies: &self.vocabularies,
            policy: self.policy,
        };
        let mut shaped = Vec::with_capacity(plans.len());
        for (plan, grid) in plans.iter().zip(grids) {
            shaped.push((plan.section, (plan.shape)(grid, plan.section, &ctx)?));
        }
        progress.advance(AssemblyStage::CategoriesNormalized);

        let mut bundle = TableBundle::new(kind.title());
        for (section, table) in shaped {
            bundle.insert(section.as_str(), fill_missing(table, source)?);
        }
        progress.advance(AssemblyStage::GapFilled);

        Ok(bundle)
    }

    /// Produce the bundle for each kind, reusing existing output unless `fresh`.
    ///
    /// Bundles are written only once every section of the report succeeded;
    /// the first failure stops processing.
    pub fn process(
        &self,
        tag: ReportTag,
        kinds: &[ReportKind],
        fresh: bool,
        source: &mut dyn MissingValueSource,
    ) -> Result<Vec<ProcessedReport>, QcmrError> {
        let processed_dir = tag.processed_dir(&self.data_dir);
        let mut located: Option<BTreeMap<ReportKind, Vec<usize>>> = None;
        let mut out = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let dir = processed_dir.join(kind.title());
            if dir.is_dir() && !fresh {
                let bundle = TableBundle::read(&dir)?;
                let missing = missing_sections(kind, &bundle);
                if missing.is_empty() {
                    info!(report = %kind, dir = %dir.display(), "loading existing bundle");
                    out.push(ProcessedReport {
                        kind,
                        bundle,
                        cached: true,
                        dir,
                    });
                    continue;
                }
                warn!(
                    report = %kind,
                    dir = %dir.display(),
                    missing = ?missing,
                    "existing bundle is incomplete, extracting again"
                );
            }

            if located.is_none() {
                located = Some(self.locate_pages(tag)?);
            }
            let found = located
                .as_ref()
                .and_then(|pages| pages.get(&kind))
                .map(Vec::as_slice)
                .unwrap_or_default();

            info!(report = %kind, tag = %tag, "extracting report");
            let bundle = self.assemble(tag, kind, found, source)?;
            bundle.write(&dir)?;
            debug!(report = %kind, stage = ?AssemblyStage::Persisted, "assembly stage");
            info!(report = %kind, tables = bundle.len(), dir = %dir.display(), "saved bundle");

            out.push(ProcessedReport {
                kind,
                bundle,
                cached: false,
                dir,
            });
        }
        Ok(out)
    }
}

/// Sections of `kind` absent from a bundle read back from disk.
fn missing_sections(kind: ReportKind, bundle: &TableBundle) -> Vec<&'static str> {
    kind.plan()
        .iter()
        .map(|plan| plan.section.as_str())
        .filter(|name| bundle.get(name).is_err())
        .collect()
}

/// Slice a section's rows out of the detected tables.
fn cut_section(tables: &[RawGrid], plan: &SectionPlan) -> Result<RawGrid, QcmrError> {
    let name = plan.section.as_str();
    let grid = tables
        .get(plan.table)
        .ok_or_else(|| QcmrError::TableNotDetected {
            section: name.to_string(),
            index: plan.table,
            found: tables.len(),
        })?;
    match plan.bounds {
        Bounds::Between { start, end } => extract_section(grid, name, start, end),
        Bounds::After { start } => extract_after(grid, name, start),
        Bounds::FromRow(row) => Ok(grid.slice_rows(row, grid.n_rows())),
    }
}
