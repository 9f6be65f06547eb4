// ============================================================
// NUMERIC NORMALIZER
// ============================================================
// Coerce locale-formatted cell text into f64 values

use once_cell::sync::Lazy;
use regex::Regex;

/// Currency glyphs and thousands separators stripped before parsing.
static CURRENCY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[₹$€,]").expect("valid regex"));

/// Parse one raw cell into a number.
///
/// Strips `₹ $ €` and commas, trims, then attempts a standard `f64` parse
/// (optional sign, decimal point, exponent). Returns `None` for anything
/// that does not survive as a finite number; cell-level coercion is never
/// an error. Both the inference pass and the final extraction pass call
/// this same function, so candidate counts always match what gets
/// aggregated.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cleaned = CURRENCY_CHARS.replace_all(cell, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }

    // f64::from_str also accepts "inf"/"NaN" spellings; those must not
    // reach the aggregates.
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}
