//! Cell parsing and numeric formatting.
//!
//! Source files encode missing cells as blanks or as one of a handful of
//! tokens; numeric cells are written back without spurious trailing zeros.

/// Tokens read as missing in addition to blank cells.
pub const DEFAULT_NULL_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "NULL", "null"];

/// Returns true if a raw cell should be read as missing.
pub fn is_null_token(value: &str, tokens: &[String]) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || tokens.iter().any(|token| token == trimmed)
}

/// Parses a string as a finite `f64`.
///
/// Returns `None` for blanks, unparsable text and non-finite values
/// (`"NaN"`, `"inf"`), so a missing marker never sneaks in as a number.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a floating-point number without trailing zeros after the decimal point.
///
/// Integer-valued floats like 40.0 are formatted as "40", not "4".
///
/// # Examples
///
/// ```
/// use tabclean_model::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(6.5), "6.5");
/// assert_eq!(format_numeric(40.0), "40");
/// ```
pub fn format_numeric(v: f64) -> String {
    trim_decimal(format!("{v}"))
}

/// Formats a number rounded to `decimals` places, trailing zeros trimmed.
///
/// # Examples
///
/// ```
/// use tabclean_model::format_rounded;
///
/// assert_eq!(format_rounded(20.0 / 3.0, 6), "6.666667");
/// assert_eq!(format_rounded(4.0, 6), "4");
/// assert_eq!(format_rounded(2.675_000_1, 2), "2.68");
/// ```
pub fn format_rounded(v: f64, decimals: u32) -> String {
    let precision = decimals as usize;
    trim_decimal(format!("{v:.precision$}"))
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (v * factor).round() / factor
}

fn trim_decimal(s: String) -> String {
    // Only trim trailing zeros if there's a decimal point
    let trimmed = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    match trimmed.as_str() {
        "" | "-0" => "0".to_string(),
        _ => trimmed,
    }
}
