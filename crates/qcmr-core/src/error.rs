use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum QcmrError {
    #[error("no report found for {tag} (expected {path})")]
    DocumentNotFound { tag: String, path: PathBuf },

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("'{section}' expected {expected} page(s) but markers matched {found:?}")]
    PageCountMismatch {
        section: String,
        expected: String,
        found: Vec<usize>,
    },

    #[error("'{section}' needs table #{index} but only {found} table(s) were detected")]
    TableNotDetected {
        section: String,
        index: usize,
        found: usize,
    },

    #[error("marker '{marker}' not found in '{section}'; the report layout may have changed")]
    MarkerNotFound { section: String, marker: String },

    #[error("end marker '{end}' (row {end_row}) precedes start marker (row {start_row}) in '{section}'")]
    MarkerOrder {
        section: String,
        end: String,
        start_row: usize,
        end_row: usize,
    },

    #[error("'{section}' has {found} value column(s), expected {expected}")]
    ColumnCountMismatch {
        section: String,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized categories in '{section}': {labels:?}")]
    UnrecognizedCategory { section: String, labels: Vec<String> },

    #[error("duplicate category '{key}' in '{section}'")]
    DuplicateCategory { section: String, key: String },

    #[error("no value supplied for category='{category}' and column='{column}'")]
    MissingValueUnresolved { category: String, column: String },

    #[error("malformed table {path}: {reason}")]
    MalformedTable { path: PathBuf, reason: String },

    #[error("unknown section '{name}'. Valid sections are: {valid}")]
    UnknownSection { name: String, valid: String },

    #[error("unknown report '{name}'. Valid reports are: {valid}")]
    UnknownReport { name: String, valid: String },

    #[error("invalid report tag: {0}")]
    InvalidTag(String),

    #[error("failed to load vocabulary from {path}: {reason}")]
    VocabularyLoad { path: PathBuf, reason: String },

    #[error("invalid vocabulary: {0}")]
    VocabularyInvalid(String),

    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("invalid comparison: {0}")]
    InvalidComparison(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
