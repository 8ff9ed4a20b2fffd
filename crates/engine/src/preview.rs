//! Raw-table preview shortening.

use funclib_io::TabularData;

use crate::normalize::normalize_header;

pub const ELLIPSIS: char = '…';

/// Shorten `s` to at most `max_len` characters, ending in an ellipsis when
/// anything was cut. A `max_len` of zero is treated as one.
pub fn truncate_text(s: &str, max_len: usize) -> String {
    let max_len = max_len.max(1);
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len - 1).collect();
    out.push(ELLIPSIS);
    out
}

/// Copy of `table` with every column whose normalized header appears in
/// `columns` truncated. `columns` is compared after normalization too.
pub fn truncate_table(table: &TabularData, columns: &[String], max_len: usize) -> TabularData {
    let mut shown = table.clone();
    let Some(headers) = table.headers() else {
        return shown;
    };

    let targets: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();
    for (col, header) in headers.iter().enumerate() {
        if targets.contains(&normalize_header(header)) {
            shown.map_column(col, |cell| truncate_text(cell, max_len));
        }
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_columns() -> Vec<String> {
        vec!["script".into(), "code".into()]
    }

    #[test]
    fn test_truncate_text_boundaries() {
        assert_eq!(truncate_text("abcdef", 6), "abcdef");
        assert_eq!(truncate_text("abcdefg", 6), "abcde…");
        assert_eq!(truncate_text("abc", 1), "…");
        assert_eq!(truncate_text("abc", 0), "…");
        assert_eq!(truncate_text("", 0), "");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("説明説明", 4), "説明説明");
        assert_eq!(truncate_text("説明説明説", 4), "説明説…");
    }

    #[test]
    fn test_only_designated_columns_truncated() {
        let long = "x".repeat(200);
        let table = TabularData::with_headers(
            vec!["Step".into(), " Code ".into(), "Description".into(), "SCRIPT".into()],
            vec![vec!["s".into(), long.clone(), long.clone(), long.clone()]],
        );

        let shown = truncate_table(&table, &default_columns(), 120);

        assert_eq!(shown.cell(0, 0), "s");
        assert_eq!(shown.cell(0, 1).chars().count(), 120);
        assert!(shown.cell(0, 1).ends_with('…'));
        assert_eq!(shown.cell(0, 2), long);
        assert_eq!(shown.cell(0, 3).chars().count(), 120);

        // input untouched
        assert_eq!(table.cell(0, 1), long);
    }

    #[test]
    fn test_headerless_table_passes_through() {
        let table = TabularData::positional(vec![vec!["code".into()], vec!["y".repeat(300)]]);
        assert_eq!(truncate_table(&table, &default_columns(), 10), table);
    }

    proptest! {
        #[test]
        fn prop_truncate_bounded(s in "\\PC{0,300}", max_len in 1usize..200) {
            let out = truncate_text(&s, max_len);
            prop_assert!(out.chars().count() <= max_len);
            if s.chars().count() <= max_len {
                prop_assert_eq!(out, s);
            }
        }
    }
}
