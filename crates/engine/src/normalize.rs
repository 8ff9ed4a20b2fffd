//! Text cleanup shared by header matching and index resolution.
//!
//! Spreadsheet exports routinely carry a byte-order mark on the first cell
//! and zero-width spaces pasted in from rich text. Both are invisible in
//! the sheet UI, so they are stripped before any comparison.

const BOM: char = '\u{feff}';
const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// Remove BOM and zero-width spaces, then trim surrounding whitespace.
pub fn clean_cell(s: &str) -> String {
    let stripped: String = s.chars().filter(|&c| c != BOM && c != ZERO_WIDTH_SPACE).collect();
    stripped.trim().to_string()
}

/// Canonical form used for header matching: cleaned and lowercased.
pub fn normalize_header(s: &str) -> String {
    clean_cell(s).to_lowercase()
}
