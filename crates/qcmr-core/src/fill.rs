use crate::error::QcmrError;
use crate::model::CanonicalTable;
use crate::parsing::values::parse_currency;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use tracing::info;

/// Supplies a replacement for a missing value.
///
/// Returning `Ok(None)` means no value is available; the caller must then
/// fail rather than guess.
pub trait MissingValueSource {
    fn resolve(&mut self, category: &str, column: &str) -> Result<Option<f64>, QcmrError>;
}

/// Replace every missing value in `table` with one supplied by `source`.
pub fn fill_missing(
    mut table: CanonicalTable,
    source: &mut dyn MissingValueSource,
) -> Result<CanonicalTable, QcmrError> {
    for (r, c) in table.missing_cells() {
        let category = table.rows[r].key.clone();
        let column = table.columns[c].clone();
        match source.resolve(&category, &column)? {
            Some(value) if value.is_finite() => {
                info!(category = %category, column = %column, value, "filled missing value");
                table.rows[r].values[c] = value;
            }
            _ => return Err(QcmrError::MissingValueUnresolved { category, column }),
        }
    }
    Ok(table)
}

/// Asks an operator over a line-oriented text stream.
pub struct PromptSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptSource { input, output }
    }
}

impl<R: BufRead, W: Write> MissingValueSource for PromptSource<R, W> {
    fn resolve(&mut self, category: &str, column: &str) -> Result<Option<f64>, QcmrError> {
        loop {
            write!(
                self.output,
                "Input missing value for category='{category}' and column='{column}': "
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let value = parse_currency(&line);
            if value.is_finite() {
                return Ok(Some(value));
            }
            writeln!(self.output, "'{}' is not a number", line.trim())?;
        }
    }
}

/// Pre-supplied answers keyed by `(category, column)`.
#[derive(Debug, Clone, Default)]
pub struct CannedSource {
    values: HashMap<(String, String), f64>,
}

impl CannedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: &str, column: &str, value: f64) -> Self {
        self.values
            .insert((category.to_string(), column.to_string()), value);
        self
    }
}

impl MissingValueSource for CannedSource {
    fn resolve(&mut self, category: &str, column: &str) -> Result<Option<f64>, QcmrError> {
        Ok(self
            .values
            .get(&(category.to_string(), column.to_string()))
            .copied())
    }
}

/// Never supplies a value: any gap aborts the section.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefuseSource;

impl MissingValueSource for RefuseSource {
    fn resolve(&mut self, _category: &str, _column: &str) -> Result<Option<f64>, QcmrError> {
        Ok(None)
    }
}
