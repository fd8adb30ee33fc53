/// Parse a currency-formatted cell into a signed number.
///
/// Handles formats like:
/// - "$1,234.50" -> 1234.5
/// - "(500)" -> -500 (accounting negative)
/// - "$(1,000)" -> -1000
/// - "0" -> 0
///
/// Anything that still fails to parse after stripping `$`, `,` and `)` and
/// turning a leading `(` into `-` is missing (`NaN`), including "" and "N/A".
pub fn parse_currency(s: &str) -> f64 {
    let stripped: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ')'))
        .collect();
    let stripped = stripped.trim();
    let normalized = match stripped.strip_prefix('(') {
        Some(rest) => format!("-{}", rest.trim_start()),
        None => stripped.to_string(),
    };
    parse_finite(&normalized)
}

/// Parse a percentage cell ("12.5%") as a plain number (12.5).
pub fn parse_percent(s: &str) -> f64 {
    parse_finite(s.trim().trim_end_matches('%').trim())
}

/// Parse a float, rejecting the textual NaN/infinity spellings Rust accepts.
fn parse_finite(s: &str) -> f64 {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}
