use crate::model::{NumericGrid, RawGrid};
use crate::parsing::values::parse_currency;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Transliterate to ASCII and strip control characters (including newlines).
///
/// Accented letters lose their accents, typographic punctuation becomes its
/// plain counterpart, and anything without an ASCII equivalent is dropped.
pub fn sanitize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfkd() {
        if c.is_ascii() {
            if !c.is_ascii_control() {
                out.push(c);
            }
            continue;
        }
        if is_combining_mark(c) || c.is_control() {
            continue;
        }
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            '\u{00D7}' => out.push('x'),
            '\u{00DF}' => out.push_str("ss"),
            '\u{00E6}' => out.push_str("ae"),
            '\u{00C6}' => out.push_str("AE"),
            '\u{0153}' => out.push_str("oe"),
            '\u{0152}' => out.push_str("OE"),
            '\u{00F8}' => out.push('o'),
            '\u{00D8}' => out.push('O'),
            '\u{0142}' => out.push('l'),
            '\u{0141}' => out.push('L'),
            '\u{0111}' => out.push('d'),
            '\u{0110}' => out.push('D'),
            c if c.is_whitespace() => out.push(' '),
            _ => {}
        }
    }
    out
}

/// Sanitize every cell of a grid.
pub fn sanitize(mut grid: RawGrid) -> RawGrid {
    for col in 0..grid.n_cols() {
        grid.map_column(col, sanitize_text);
    }
    grid
}

/// Sanitize and trim only the label column.
pub fn sanitize_labels(mut grid: RawGrid) -> RawGrid {
    grid.map_column(0, |cell| sanitize_text(cell).trim().to_string());
    grid
}

/// A cell that carries no data: empty, or a lone period.
pub fn is_placeholder(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || t == "."
}

/// Drop every column in which all cells are placeholders.
pub fn remove_empty_columns(mut grid: RawGrid) -> RawGrid {
    let keep: Vec<bool> = (0..grid.n_cols())
        .map(|c| grid.column(c).any(|cell| !is_placeholder(cell)))
        .collect();
    grid.retain_columns(&keep);
    grid
}

/// Treat blank value cells as zero.
pub fn blanks_as_zero(mut grid: RawGrid) -> RawGrid {
    grid.map_values(|cell| {
        if cell.trim().is_empty() {
            "0".to_string()
        } else {
            cell.to_string()
        }
    });
    grid
}

/// Parse every column after the label column as currency.
///
/// Unparseable cells become `NaN` and are left to gap filling.
pub fn to_numeric(grid: &RawGrid) -> NumericGrid {
    to_numeric_with(grid, parse_currency)
}

/// Like [`to_numeric`] with a custom cell parser.
pub fn to_numeric_with(grid: &RawGrid, parse: fn(&str) -> f64) -> NumericGrid {
    let mut out = NumericGrid::default();
    for row in grid.rows() {
        out.labels.push(row.first().cloned().unwrap_or_default());
        out.values
            .push(row.iter().skip(1).map(|cell| parse(cell)).collect());
    }
    out
}
