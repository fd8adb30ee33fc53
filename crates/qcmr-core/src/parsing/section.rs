use crate::error::QcmrError;
use crate::model::RawGrid;

/// Index of the first row whose label cell exactly equals one of `markers`.
pub fn find_row(grid: &RawGrid, markers: &[&str]) -> Option<usize> {
    (0..grid.n_rows()).find(|&i| markers.contains(&grid.first_cell(i)))
}

/// Slice the rows after a start marker through the end marker.
///
/// The start row itself is excluded and the end row included. A missing
/// marker or an end row before the start row means the report layout
/// changed, and is an error.
pub fn extract_section(
    grid: &RawGrid,
    section: &str,
    start_markers: &[&str],
    end_marker: &str,
) -> Result<RawGrid, QcmrError> {
    let start = find_row(grid, start_markers).ok_or_else(|| QcmrError::MarkerNotFound {
        section: section.to_string(),
        marker: start_markers.join(" | "),
    })?;
    let end = find_row(grid, &[end_marker]).ok_or_else(|| QcmrError::MarkerNotFound {
        section: section.to_string(),
        marker: end_marker.to_string(),
    })?;
    if end < start {
        return Err(QcmrError::MarkerOrder {
            section: section.to_string(),
            end: end_marker.to_string(),
            start_row: start,
            end_row: end,
        });
    }
    Ok(grid.slice_rows(start + 1, end + 1))
}

/// Slice every row after the start marker to the end of the grid.
pub fn extract_after(
    grid: &RawGrid,
    section: &str,
    start_markers: &[&str],
) -> Result<RawGrid, QcmrError> {
    let start = find_row(grid, start_markers).ok_or_else(|| QcmrError::MarkerNotFound {
        section: section.to_string(),
        marker: start_markers.join(" | "),
    })?;
    Ok(grid.slice_rows(start + 1, grid.n_rows()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cash_grid() -> RawGrid {
        RawGrid::from_strs(&[
            &["CASH FLOW PROJECTIONS", "", ""],
            &["REVENUES", "", ""],
            &["Real Estate Tax", "$100", "$200"],
            &["Sales Tax", "$10", "$20"],
            &["TOTAL CASH RECEIPTS", "$110", "$220"],
            &["EXPENSES AND OBLIGATIONS", "", ""],
            &["Payroll", "$50", "$50"],
            &["TOTAL DISBURSEMENTS", "$50", "$50"],
            &["CLOSING BALANCE", "$60", "$170"],
        ])
    }

    #[test]
    fn test_boundaries() {
        let sub = extract_section(&cash_grid(), "gf_revenue", &["REVENUES"], "TOTAL CASH RECEIPTS")
            .unwrap();
        assert_eq!(sub.n_rows(), 3);
        assert_eq!(sub.first_cell(0), "Real Estate Tax");
        assert_eq!(sub.first_cell(2), "TOTAL CASH RECEIPTS");
    }

    #[test]
    fn test_reextracting_without_start_marker_fails() {
        let sub = extract_section(&cash_grid(), "gf_revenue", &["REVENUES"], "TOTAL CASH RECEIPTS")
            .unwrap();
        let again = extract_section(&sub, "gf_revenue", &["REVENUES"], "TOTAL CASH RECEIPTS");
        assert!(matches!(again, Err(QcmrError::MarkerNotFound { .. })));
    }

    #[test]
    fn test_reextracting_with_markers_present_is_stable() {
        let sub = extract_section(
            &cash_grid(),
            "cash",
            &["CASH FLOW PROJECTIONS"],
            "CLOSING BALANCE",
        )
        .unwrap();
        let once = extract_section(&sub, "gf_revenue", &["REVENUES"], "TOTAL CASH RECEIPTS").unwrap();
        let direct =
            extract_section(&cash_grid(), "gf_revenue", &["REVENUES"], "TOTAL CASH RECEIPTS").unwrap();
        assert_eq!(once, direct);
    }

    #[test]
    fn test_missing_end_marker() {
        let err = extract_section(&cash_grid(), "gf_revenue", &["REVENUES"], "TOTAL REVENUE")
            .unwrap_err();
        match err {
            QcmrError::MarkerNotFound { marker, .. } => assert_eq!(marker, "TOTAL REVENUE"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_end_before_start() {
        let err = extract_section(
            &cash_grid(),
            "gf_spending",
            &["EXPENSES AND OBLIGATIONS"],
            "TOTAL CASH RECEIPTS",
        )
        .unwrap_err();
        assert!(matches!(err, QcmrError::MarkerOrder { .. }));
    }

    #[test]
    fn test_any_start_marker() {
        let sub = extract_section(
            &cash_grid(),
            "gf_revenue",
            &["RECEIPTS", "REVENUES"],
            "TOTAL CASH RECEIPTS",
        )
        .unwrap();
        assert_eq!(sub.first_cell(0), "Real Estate Tax");
    }

    #[test]
    fn test_extract_after() {
        let sub = extract_after(&cash_grid(), "gf_balance_sheet", &["TOTAL DISBURSEMENTS"]).unwrap();
        assert_eq!(sub.n_rows(), 1);
        assert_eq!(sub.first_cell(0), "CLOSING BALANCE");
    }
}
