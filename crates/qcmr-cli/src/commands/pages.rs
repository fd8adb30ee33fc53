use qcmr_core::config::AssemblerConfig;
use qcmr_core::error::QcmrError;
use qcmr_core::extraction::pdftotext::PdftotextExtractor;
use qcmr_core::extraction::table::LayoutTableDetector;
use qcmr_core::report::assembler::ReportAssembler;
use qcmr_core::tag::ReportTag;

pub fn run(config: &AssemblerConfig, year: u32, quarter: u32) -> Result<(), QcmrError> {
    let tag = ReportTag::new(year, quarter)?;
    let detector = LayoutTableDetector::new(PdftotextExtractor::new());
    let extractor = detector.extractor();
    let assembler = ReportAssembler::new(config, extractor, &detector)?;

    println!("{}\n", tag.label());
    for (kind, pages) in assembler.locate_pages(tag)? {
        // zero-based internally, printed as PDF page numbers
        let numbers: Vec<String> = pages.iter().map(|p| (p + 1).to_string()).collect();
        let shown = if numbers.is_empty() {
            "not found".to_string()
        } else {
            numbers.join(", ")
        };
        println!("  {:<26} {}", kind.title(), shown);
    }
    Ok(())
}
