use serde::Serialize;

/// A rectangular grid of string cells, optionally with a header row.
///
/// Columns are addressed by position. Header names are kept verbatim,
/// including duplicates and empty names, so lookups by name are left to
/// callers that know how they want to break ties.
///
/// Invariant: the header list (when present) and every row have the same
/// width. Short input records are padded with `""` on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TabularData {
    headers: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl TabularData {
    /// Build a table, padding every record out to the widest one.
    pub fn new(headers: Option<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .chain(headers.as_ref().map(Vec::len))
            .max()
            .unwrap_or(0);

        let pad = |mut cells: Vec<String>| {
            cells.resize(width, String::new());
            cells
        };

        Self {
            headers: headers.map(pad),
            rows: rows.into_iter().map(pad).collect(),
            width,
        }
    }

    /// Table whose first record names the columns.
    pub fn with_headers(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::new(Some(headers), rows)
    }

    /// Table addressed purely by column position.
    pub fn positional(rows: Vec<Vec<String>>) -> Self {
        Self::new(None, rows)
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, or `""` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Iterate one column top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r.get(col).map(String::as_str).unwrap_or(""))
    }

    /// Rewrite every cell of `col` in place.
    pub fn map_column(&mut self, col: usize, mut f: impl FnMut(&str) -> String) {
        if col >= self.width {
            return;
        }
        for row in &mut self.rows {
            let replaced = f(&row[col]);
            row[col] = replaced;
        }
    }
}
