//! Text and JSON rendering of panels, cards and preview tables.

use std::io::{self, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use funclib_engine::filter::filter_indices;
use funclib_engine::{DisplayMode, FunctionRecord, HeaderMatch, LibraryError, LoadedTab, RecordId, TabPanel};
use funclib_io::TabularData;

const NO_STEP: &str = "(No Step_ID)";
const NO_DESCRIPTION: &str = "(no Description)";
const NO_PREVIEW: &str = r#"<div style="padding:16px;font:14px system-ui;color:#444">(No 画像 HTML)</div>"#;

/// Badge labels shown above the title, empty ones skipped.
pub fn badges(record: &FunctionRecord) -> Vec<&str> {
    [&record.section, &record.option1, &record.option2]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Body text of a card in the given mode.
pub fn card_body(record: &FunctionRecord, mode: DisplayMode) -> &str {
    match mode {
        DisplayMode::Description if record.description.is_empty() => NO_DESCRIPTION,
        DisplayMode::Description => record.description.as_str(),
        DisplayMode::Code => record.code.as_str(),
        DisplayMode::Preview if record.preview_markup.is_empty() => NO_PREVIEW,
        DisplayMode::Preview => record.preview_markup.as_str(),
    }
}

pub fn write_card(
    out: &mut impl Write,
    number: usize,
    record: &FunctionRecord,
    mode: DisplayMode,
) -> io::Result<()> {
    let title = if record.step.is_empty() { NO_STEP } else { record.step.as_str() };
    writeln!(out, "#{} {}", number, title)?;

    let badges = badges(record);
    if !badges.is_empty() {
        let line: Vec<String> = badges.iter().map(|b| format!("[{}]", b)).collect();
        writeln!(out, "   {}", line.join(" "))?;
    }

    writeln!(out, "   -- {} --", mode)?;
    for line in card_body(record, mode).lines() {
        writeln!(out, "   {}", line)?;
    }
    writeln!(out)
}

/// Print one tab: title, match count, then the filtered cards numbered
/// from 1 in display order.
pub fn write_panel(
    out: &mut impl Write,
    tab: &LoadedTab,
    query: &str,
    mode_for: impl Fn(&RecordId) -> DisplayMode,
) -> io::Result<()> {
    let shown = filter_indices(&tab.records, query);
    writeln!(out, "=== {} ===", tab.name)?;
    writeln!(out, "Showing {}/{} items", shown.len(), tab.records.len())?;
    writeln!(out)?;

    for (n, &idx) in shown.iter().enumerate() {
        write_card(out, n + 1, &tab.records[idx], mode_for(&tab.ids[idx]))?;
    }
    Ok(())
}

pub fn write_error_panel(out: &mut impl Write, name: &str, err: &LibraryError) -> io::Result<()> {
    writeln!(out, "=== {} ===", name)?;
    writeln!(out, "error: couldn't load this tab: {}", err)?;
    writeln!(out)
}

// ── JSON ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JsonCard<'a> {
    pub id: RecordId,
    pub mode: DisplayMode,
    #[serde(flatten)]
    pub record: &'a FunctionRecord,
}

#[derive(Debug, Serialize)]
pub struct JsonPanel<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shown: Option<usize>,
    /// Column each field was read from; absent for error panels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<HeaderMatch>,
    /// Present (possibly empty) for every loaded tab
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<JsonCard<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> JsonPanel<'a> {
    pub fn loaded(tab: &'a LoadedTab, query: &str, mode: DisplayMode) -> Self {
        let shown = filter_indices(&tab.records, query);
        let records = shown
            .iter()
            .map(|&idx| JsonCard {
                id: tab.ids[idx],
                mode,
                record: &tab.records[idx],
            })
            .collect();

        Self {
            name: &tab.name,
            total: Some(tab.records.len()),
            shown: Some(shown.len()),
            columns: Some(tab.matched),
            records: Some(records),
            error: None,
        }
    }

    pub fn from_panel(panel: &'a TabPanel, query: &str, mode: DisplayMode) -> Self {
        match &panel.outcome {
            Ok(tab) => Self::loaded(tab, query, mode),
            Err(e) => Self {
                name: &panel.name,
                total: None,
                shown: None,
                columns: None,
                records: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// ── Preview table ───────────────────────────────────────────────────

fn one_line(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

/// Aligned plain-text table. Multi-line cells are flattened.
pub fn write_table(out: &mut impl Write, table: &TabularData) -> io::Result<()> {
    let mut lines: Vec<Vec<String>> = Vec::with_capacity(table.row_count() + 1);
    if let Some(headers) = table.headers() {
        lines.push(headers.iter().map(|h| one_line(h)).collect());
    }
    lines.extend(table.rows().iter().map(|r| r.iter().map(|c| one_line(c)).collect()));

    let mut widths = vec![0usize; table.width()];
    for line in &lines {
        for (col, cell) in line.iter().enumerate() {
            widths[col] = widths[col].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    for (i, line) in lines.iter().enumerate() {
        let mut text = String::new();
        for (col, cell) in line.iter().enumerate() {
            if col > 0 {
                text.push_str(" | ");
            }
            text.push_str(cell);
            let pad = widths[col] - UnicodeWidthStr::width(cell.as_str());
            text.extend(std::iter::repeat(' ').take(pad));
        }
        writeln!(out, "{}", text.trim_end())?;

        if i == 0 && table.headers().is_some() {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            writeln!(out, "{}", rule.join("-+-"))?;
        }
    }
    Ok(())
}

/// Table as CSV, header row first when present.
pub fn write_table_csv(out: impl Write, table: &TabularData) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    if let Some(headers) = table.headers() {
        writer.write_record(headers)?;
    }
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
