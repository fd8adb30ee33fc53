//! Comparisons over the persisted cash forecast bundles.

pub mod cash_report;
pub mod compare;
pub mod revisions;
pub mod series;

pub use cash_report::{CashKind, CashReport, KindChanges, KindComparison};
pub use compare::{ChangeRow, Comparison, ComparisonKind, ComparisonRow};
pub use series::{load_cash_series, CashRecord, CashSeries};
