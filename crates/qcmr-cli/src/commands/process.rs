use qcmr_core::config::AssemblerConfig;
use qcmr_core::error::QcmrError;
use qcmr_core::extraction::pdftotext::PdftotextExtractor;
use qcmr_core::extraction::table::LayoutTableDetector;
use qcmr_core::fill::{PromptSource, RefuseSource};
use qcmr_core::report::ReportKind;
use qcmr_core::tag::ReportTag;
use qcmr_core::{process_report, ProcessOptions};
use std::io;

use crate::output;

pub fn run(
    config: &AssemblerConfig,
    year: u32,
    quarter: u32,
    reports: &[String],
    fresh: bool,
    non_interactive: bool,
    output_format: &str,
) -> Result<(), QcmrError> {
    let tag = ReportTag::new(year, quarter)?;
    let kinds = if reports.is_empty() {
        ReportKind::ALL.to_vec()
    } else {
        reports
            .iter()
            .map(|r| r.parse::<ReportKind>())
            .collect::<Result<Vec<_>, _>>()?
    };
    let options = ProcessOptions { kinds, fresh };

    let detector = LayoutTableDetector::new(PdftotextExtractor::new());
    let extractor = detector.extractor();

    let processed = if non_interactive {
        process_report(config, tag, extractor, &detector, &mut RefuseSource, &options)?
    } else {
        // prompts go to stderr so stdout stays machine-readable
        let mut source = PromptSource::new(io::stdin().lock(), io::stderr());
        process_report(config, tag, extractor, &detector, &mut source, &options)?
    };

    match output_format {
        "json" => output::json::print(&processed)?,
        _ => output::table::print_processed(&processed),
    }
    Ok(())
}
