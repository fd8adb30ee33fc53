pub mod analysis;
pub mod bundle;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fill;
pub mod locate;
pub mod model;
pub mod parsing;
pub mod report;
pub mod tag;
pub mod vocabulary;

use config::AssemblerConfig;
use error::QcmrError;
use extraction::{PdfExtractor, TableDetector};
use fill::MissingValueSource;
use report::assembler::{ProcessedReport, ReportAssembler};
use report::ReportKind;
use tag::ReportTag;

/// Which reports to produce and whether to ignore existing output.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub kinds: Vec<ReportKind>,
    /// Re-extract even when a report's output directory already exists.
    pub fresh: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        ProcessOptions {
            kinds: ReportKind::ALL.to_vec(),
            fresh: false,
        }
    }
}

/// Main API entry point: extract, normalize and persist the reports of one
/// quarterly PDF.
///
/// Missing values are resolved through `source`; a report whose output
/// already exists is loaded from disk unless `options.fresh` is set.
pub fn process_report(
    config: &AssemblerConfig,
    tag: ReportTag,
    extractor: &dyn PdfExtractor,
    detector: &dyn TableDetector,
    source: &mut dyn MissingValueSource,
    options: &ProcessOptions,
) -> Result<Vec<ProcessedReport>, QcmrError> {
    let assembler = ReportAssembler::new(config, extractor, detector)?;
    assembler.process(tag, &options.kinds, options.fresh, source)
}
