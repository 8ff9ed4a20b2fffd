//! Index tab resolution.
//!
//! The index tab is read without a header. Row 1 is assumed to be a title
//! row; tab names are read from row 2 down in a single column. Which column
//! is either forced by configuration or found by scanning left to right for
//! the first one that has any name below the title row.

use funclib_io::TabularData;

use crate::error::LibraryError;
use crate::normalize::clean_cell;

/// Pick the column holding tab names.
///
/// A forced column wins when it exists in the table; an out-of-range one
/// is ignored with a warning. Otherwise the first column with a
/// non-empty cleaned cell in rows 2..N is chosen. Tables with fewer than
/// two rows never yield a column from the scan.
pub fn pick_column(table: &TabularData, force: Option<usize>) -> Option<usize> {
    match force {
        Some(col) if col < table.width() => return Some(col),
        Some(col) => log::warn!(
            "index_column {} is out of range (index tab has {} column(s)); auto-detecting",
            col,
            table.width()
        ),
        None => {}
    }

    (0..table.width()).find(|&col| table.column(col).skip(1).any(|cell| !clean_cell(cell).is_empty()))
}

/// Ordered tab names from the index table. Duplicates are kept.
pub fn resolve_tab_names(table: &TabularData, force: Option<usize>) -> Result<Vec<String>, LibraryError> {
    if table.is_empty() {
        return Err(LibraryError::EmptyIndex);
    }

    let col = pick_column(table, force).ok_or(LibraryError::NoUsableColumn)?;

    let names: Vec<String> = table
        .column(col)
        .skip(1)
        .map(clean_cell)
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Err(LibraryError::AllRowsEmpty);
    }
    Ok(names)
}
