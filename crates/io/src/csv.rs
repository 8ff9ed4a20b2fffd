// CSV export parsing

use crate::error::FetchError;
use crate::table::TabularData;

/// Decode an export body to UTF-8.
///
/// The export endpoint serves UTF-8, but sheets pasted from legacy
/// tools occasionally come through as Windows-1252. Fall back instead of
/// failing the whole tab.
pub fn decode_body(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("export body is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse comma-separated text into a table.
///
/// With `with_header`, the first record becomes the header list verbatim.
/// Records may be ragged; [`TabularData`] pads them. Blank lines are
/// skipped by the reader.
pub fn parse_table(content: &str, with_header: bool) -> Result<TabularData, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| FetchError::Parse(format!("record {}: {}", idx + 1, e)))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    if !with_header {
        return Ok(TabularData::positional(records));
    }

    let mut records = records.into_iter();
    let headers = records.next().unwrap_or_default();
    Ok(TabularData::with_headers(headers, records.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header_quoted_fields() {
        let body = "\"Step_ID\",\"説明\",\"Code\"\n\"S1\",\"does a thing\",\"print(1)\"\n\"S2\",\"multi\nline\",\"a, b\"\n";
        let t = parse_table(body, true).unwrap();

        assert_eq!(t.headers().unwrap(), &["Step_ID", "説明", "Code"]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.cell(1, 1), "multi\nline");
        assert_eq!(t.cell(1, 2), "a, b");
    }

    #[test]
    fn test_parse_without_header_keeps_first_row() {
        let t = parse_table("Header\n,FuncA,\n,FuncB,\n", false).unwrap();

        assert!(t.headers().is_none());
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.width(), 3);
        assert_eq!(t.cell(0, 0), "Header");
        assert_eq!(t.cell(2, 1), "FuncB");
    }

    #[test]
    fn test_duplicate_and_empty_headers_preserved() {
        let t = parse_table("code,,code\n1,2,3\n", true).unwrap();
        assert_eq!(t.headers().unwrap(), &["code", "", "code"]);
    }

    #[test]
    fn test_empty_body() {
        let t = parse_table("", true).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.headers().unwrap().len(), 0);

        let t = parse_table("", false).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn test_header_only_body_has_no_rows() {
        let t = parse_table("\"step\",\"code\"\n", true).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.width(), 2);
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_windows_1252() {
        // 0xE9 is 'é' in Windows-1252 and invalid as a lone UTF-8 byte
        let decoded = decode_body(vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(decoded, "café");

        assert_eq!(decode_body("説明".as_bytes().to_vec()), "説明");
    }
}
