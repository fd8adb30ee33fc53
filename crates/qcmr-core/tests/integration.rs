//! Integration tests for process_report() end-to-end pipeline.
//!
//! Uses a MockExtractor that returns pre-built PageContent and a
//! MockDetector that returns pre-built grids, so these tests run without
//! poppler-utils or a real PDF.

use qcmr_core::bundle::TableBundle;
use qcmr_core::config::AssemblerConfig;
use qcmr_core::error::QcmrError;
use qcmr_core::extraction::table::LayoutTableDetector;
use qcmr_core::extraction::{DetectMode, PageContent, PdfExtractor, TableDetector};
use qcmr_core::fill::{CannedSource, RefuseSource};
use qcmr_core::model::RawGrid;
use qcmr_core::parsing::categories::UnmappedPolicy;
use qcmr_core::report::{ReportKind, Section};
use qcmr_core::tag::ReportTag;
use qcmr_core::{process_report, ProcessOptions};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone)]
struct MockExtractor {
    pages: Vec<PageContent>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_path: &Path) -> Result<Vec<PageContent>, QcmrError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct MockDetector {
    grids: HashMap<usize, Vec<RawGrid>>,
    calls: Cell<usize>,
}

impl TableDetector for MockDetector {
    fn detect_tables(
        &self,
        _pdf_path: &Path,
        pages: &[usize],
        _mode: DetectMode,
    ) -> Result<Vec<RawGrid>, QcmrError> {
        self.calls.set(self.calls.get() + 1);
        Ok(pages
            .iter()
            .flat_map(|p| self.grids.get(p).cloned().unwrap_or_default())
            .collect())
    }
}

fn tag() -> ReportTag {
    ReportTag::new(2019, 2).unwrap()
}

/// A data directory holding an (unread) raw PDF for FY19 Q2.
fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    std::fs::create_dir_all(&raw).unwrap();
    std::fs::write(raw.join("FY19_Q2.pdf"), b"%PDF-1.4").unwrap();
    dir
}

fn config(dir: &Path) -> AssemblerConfig {
    AssemblerConfig {
        data_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

fn marker_pages() -> MockExtractor {
    let texts = [
        "Contents",
        "CASH FLOW PROJECTIONS\nGeneral Fund",
        "CASH FLOW PROJECTIONS\nAll Funds",
        "TOTAL LEAVE USAGE ANALYSIS\nSummary",
        "Overtime",
        "TOTAL LEAVE USAGE ANALYSIS\nBy Department",
        "By Department (continued)",
        "Debt",
        "DEPARTMENTAL OBLIGATIONS SUMMARY",
        "DEPARTMENTAL OBLIGATIONS SUMMARY (continued)",
    ];
    MockExtractor {
        pages: texts
            .iter()
            .enumerate()
            .map(|(i, t)| PageContent::new(i, t))
            .collect(),
    }
}

fn label(text: &str) -> Vec<String> {
    vec![text.to_string()]
}

fn row(name: &str, cells: impl IntoIterator<Item = String>) -> Vec<String> {
    std::iter::once(name.to_string()).chain(cells).collect()
}

/// Twelve monthly values plus a trailing annual total.
fn flow(label: &str, base: u32) -> Vec<String> {
    let months = (0..12).map(move |i| format!("${}", base + i));
    row(label, months.chain(std::iter::once(format!("${}", base * 12))))
}

fn balance(label: &str, base: u32) -> Vec<String> {
    row(label, (0..12).map(move |i| format!("${},{:03}", base, i)))
}

fn general_fund_grid() -> RawGrid {
    let mut closing = balance("CLOSING BALANCE", 3);
    closing[7] = String::new();
    RawGrid::new(vec![
        label("CASH FLOW PROJECTIONS"),
        label("REVENUES"),
        flow("Real Estate Tax", 100),
        flow("Lottery Proceeds", 5),
        flow("TOTAL CASH RECEIPTS", 500),
        label("EXPENSES AND OBLIGATIONS"),
        flow("Payroll", 200),
        flow("Purchase of Services", 50),
        flow("TOTAL DISBURSEMENTS", 250),
        balance("Opening Balance", 1),
        closing,
    ])
}

fn fund_balance_grid() -> RawGrid {
    let mut general = balance("General", 7);
    general[4] = "N/A".into();
    RawGrid::new(vec![
        label("FUND BALANCES"),
        row("Fund", ["Jul", "Aug", "Sep"].map(String::from)),
        general,
        balance("Grants Revenue", 2),
        balance("TOTAL FUND EQUITY", 9),
        label(""),
    ])
}

fn leave_grid(scale: f64) -> RawGrid {
    let pct = |v: f64| format!("{:.1}%", v * scale);
    RawGrid::new(vec![
        label("TOTAL LEAVE USAGE ANALYSIS"),
        row("Department", ["Sick", "Vacation", "Total"].map(String::from)),
        row("Police", [pct(3.0), pct(4.0), pct(7.0)]),
        row("Fire - Admin", [pct(2.0), pct(5.0), pct(7.0)]),
    ])
}

fn obligations_grid() -> RawGrid {
    RawGrid::from_strs(&[
        &["DEPARTMENTAL OBLIGATIONS SUMMARY", "", ""],
        &["", "", ""],
        &["", "FY19", "Target"],
        &["Department", "Adopted", "Budget"],
        &["", "", ""],
        &["Police", "$700,000", "$710,000"],
        &["Fire", "$300,000", "$305,000"],
    ])
}

fn detector() -> MockDetector {
    let mut grids = HashMap::new();
    grids.insert(1, vec![general_fund_grid()]);
    grids.insert(2, vec![fund_balance_grid()]);
    grids.insert(5, vec![leave_grid(1.0)]);
    grids.insert(6, vec![leave_grid(2.0)]);
    grids.insert(8, vec![obligations_grid()]);
    grids.insert(9, vec![obligations_grid()]);
    MockDetector {
        grids,
        calls: Cell::new(0),
    }
}

fn answers() -> CannedSource {
    CannedSource::new().with("general_fund", "oct", 42.0)
}

// ---------------------------------------------------------------------------
// Test 1: every report extracted, normalized and persisted
// ---------------------------------------------------------------------------
#[test]
fn process_all_reports() {
    let dir = data_dir();
    let detector = detector();
    let reports = process_report(
        &config(dir.path()),
        tag(),
        &marker_pages(),
        &detector,
        &mut answers(),
        &ProcessOptions::default(),
    )
    .unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| !r.cached));

    let cash_dir = dir.path().join("processed/FY19_Q2/Cash Flow Forecast");
    for name in ["gf_revenue", "gf_spending", "gf_balance_sheet", "fund_balances"] {
        assert!(cash_dir.join(format!("{name}.csv")).is_file(), "{name}");
    }

    let cash = TableBundle::read(&cash_dir).unwrap();
    assert_eq!(cash.title, "Cash Flow Forecast");

    let revenue = cash.section(Section::GfRevenue).unwrap();
    assert_eq!(revenue.columns.len(), 12);
    assert_eq!(
        revenue.keys().collect::<Vec<_>>(),
        vec!["real_estate_tax", "total_cash_receipts"]
    );
    assert_eq!(revenue.value("real_estate_tax", "jun"), Some(111.0));

    let spending = cash.section(Section::GfSpending).unwrap();
    assert_eq!(spending.value("purchases_of_services", "jul"), Some(50.0));
    assert_eq!(spending.value("total_disbursements", "dec"), Some(255.0));

    let balance_sheet = cash.section(Section::GfBalanceSheet).unwrap();
    assert_eq!(balance_sheet.value("opening_balance", "aug"), Some(1001.0));
    assert_eq!(balance_sheet.value("closing_balance", "jan"), Some(0.0));

    let funds = cash.section(Section::FundBalances).unwrap();
    assert_eq!(funds.value("general_fund", "oct"), Some(42.0));
    assert_eq!(funds.value("total_fund_equity", "jul"), Some(9000.0));
    assert!(funds.is_complete());

    let leave = TableBundle::read(&dir.path().join("processed/FY19_Q2/Leave Usage Analysis"))
        .unwrap();
    let ytd = leave.section(Section::Ytd).unwrap();
    assert_eq!(ytd.value("Fire: Admin", "vacation_other"), Some(10.0));

    let obligations =
        TableBundle::read(&dir.path().join("processed/FY19_Q2/General Fund Obligations"))
            .unwrap();
    let second = obligations.section(Section::Second).unwrap();
    assert_eq!(second.key_column, "Department");
    assert_eq!(second.value("Fire", "Target Budget"), Some(305_000.0));
}

// ---------------------------------------------------------------------------
// Test 2: an unanswered gap fails the report and writes nothing
// ---------------------------------------------------------------------------
#[test]
fn unresolved_missing_value_aborts() {
    let dir = data_dir();
    let err = process_report(
        &config(dir.path()),
        tag(),
        &marker_pages(),
        &detector(),
        &mut RefuseSource,
        &ProcessOptions {
            kinds: vec![ReportKind::CashForecast],
            fresh: false,
        },
    )
    .unwrap_err();

    match err {
        QcmrError::MissingValueUnresolved { category, column } => {
            assert_eq!(category, "general_fund");
            assert_eq!(column, "oct");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("processed/FY19_Q2/Cash Flow Forecast").exists());
}

// ---------------------------------------------------------------------------
// Test 3: strict category policy rejects unknown labels
// ---------------------------------------------------------------------------
#[test]
fn strict_categories_reject_unknown_label() {
    let dir = data_dir();
    let config = AssemblerConfig {
        unmapped: UnmappedPolicy::Fail,
        ..config(dir.path())
    };
    let err = process_report(
        &config,
        tag(),
        &marker_pages(),
        &detector(),
        &mut answers(),
        &ProcessOptions {
            kinds: vec![ReportKind::CashForecast],
            fresh: false,
        },
    )
    .unwrap_err();

    match err {
        QcmrError::UnrecognizedCategory { section, labels } => {
            assert_eq!(section, "gf_revenue");
            assert_eq!(labels, vec!["Lottery Proceeds".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Test 4: wrong number of marker pages
// ---------------------------------------------------------------------------
#[test]
fn single_cash_page_is_rejected() {
    let dir = data_dir();
    let mut extractor = marker_pages();
    extractor.pages[2] = PageContent::new(2, "All Funds");

    let err = process_report(
        &config(dir.path()),
        tag(),
        &extractor,
        &detector(),
        &mut answers(),
        &ProcessOptions {
            kinds: vec![ReportKind::CashForecast],
            fresh: false,
        },
    )
    .unwrap_err();

    match err {
        QcmrError::PageCountMismatch { section, found, .. } => {
            assert_eq!(section, "cash_forecast");
            assert_eq!(found, vec![1]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Test 5: missing raw PDF
// ---------------------------------------------------------------------------
#[test]
fn missing_document() {
    let dir = tempfile::tempdir().unwrap();
    let err = process_report(
        &config(dir.path()),
        tag(),
        &marker_pages(),
        &detector(),
        &mut answers(),
        &ProcessOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, QcmrError::DocumentNotFound { .. }));
}

// ---------------------------------------------------------------------------
// Test 6: existing output is reused unless fresh
// ---------------------------------------------------------------------------
#[test]
fn existing_bundles_are_reused() {
    let dir = data_dir();
    let config = config(dir.path());
    let extractor = marker_pages();
    let detector = detector();
    let options = ProcessOptions::default();

    process_report(&config, tag(), &extractor, &detector, &mut answers(), &options).unwrap();
    assert_eq!(detector.calls.get(), 3);

    let again =
        process_report(&config, tag(), &extractor, &detector, &mut answers(), &options).unwrap();
    assert_eq!(detector.calls.get(), 3);
    assert!(again.iter().all(|r| r.cached));
    assert_eq!(
        again[1].bundle.section(Section::FundBalances).unwrap().value("general_fund", "oct"),
        Some(42.0)
    );

    let fresh = ProcessOptions {
        kinds: vec![ReportKind::LeaveUsage],
        fresh: true,
    };
    let redone =
        process_report(&config, tag(), &extractor, &detector, &mut answers(), &fresh).unwrap();
    assert_eq!(detector.calls.get(), 4);
    assert!(!redone[0].cached);
}

// ---------------------------------------------------------------------------
// Test 7: an interrupted run's partial output is extracted again
// ---------------------------------------------------------------------------
#[test]
fn partial_bundle_is_rebuilt() {
    let dir = data_dir();
    let cash_dir = dir.path().join("processed/FY19_Q2/Cash Flow Forecast");
    std::fs::create_dir_all(&cash_dir).unwrap();
    std::fs::write(cash_dir.join("gf_spending.csv"), "category,jul\npayroll,1\n").unwrap();

    let detector = detector();
    let reports = process_report(
        &config(dir.path()),
        tag(),
        &marker_pages(),
        &detector,
        &mut answers(),
        &ProcessOptions {
            kinds: vec![ReportKind::CashForecast],
            fresh: false,
        },
    )
    .unwrap();

    assert_eq!(detector.calls.get(), 1);
    assert!(!reports[0].cached);
    assert_eq!(
        reports[0].bundle.names().collect::<Vec<_>>(),
        vec!["fund_balances", "gf_balance_sheet", "gf_revenue", "gf_spending"]
    );

    let reread = TableBundle::read(&cash_dir).unwrap();
    assert_eq!(reread.len(), 4);
    assert_eq!(
        reread.section(Section::GfSpending).unwrap().value("payroll", "jul"),
        Some(200.0)
    );
}

// ---------------------------------------------------------------------------
// Test 8: layout text through the whitespace table detector
// ---------------------------------------------------------------------------
#[test]
fn leave_usage_from_layout_text() {
    let dir = data_dir();
    let line = |a: &str, b: &str, c: &str, d: &str| format!("{a:<16}{b:<10}{c:<12}{d}");
    let table = |scale: f64| {
        [
            line("Department", "Sick", "Vacation", "Total"),
            line("Police", &format!("{:.1}%", 3.0 * scale), "4.0%", "7.0%"),
            line("Fire - Admin", "2.0%", "5.0%", "7.0%"),
        ]
        .join("\n")
    };
    let mut extractor = marker_pages();
    extractor.pages[5] = PageContent::new(
        5,
        &format!("TOTAL LEAVE USAGE ANALYSIS\n\n\n{}", table(1.0)),
    );
    extractor.pages[6] = PageContent::new(6, &table(2.0));
    let detector = LayoutTableDetector::new(extractor.clone());

    let reports = process_report(
        &config(dir.path()),
        tag(),
        &extractor,
        &detector,
        &mut RefuseSource,
        &ProcessOptions {
            kinds: vec![ReportKind::LeaveUsage],
            fresh: false,
        },
    )
    .unwrap();

    let bundle = &reports[0].bundle;
    let quarter = bundle.section(Section::QuarterOnly).unwrap();
    assert_eq!(quarter.keys().collect::<Vec<_>>(), vec!["Police", "Fire: Admin"]);
    assert_eq!(quarter.value("Police", "sickness_injury"), Some(3.0));
    assert_eq!(quarter.value("Police", "total"), Some(7.0));
    let ytd = bundle.section(Section::Ytd).unwrap();
    assert_eq!(ytd.value("Police", "sickness_injury"), Some(6.0));
}
