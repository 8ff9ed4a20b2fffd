//! Header-synonym column mapping.
//!
//! Tabs are maintained by hand, in English or Japanese, with whatever
//! column titles the author preferred. Each logical field has a fixed set
//! of recognized (normalized) titles; the first matching column from the
//! left wins. Fields with no matching column are empty for every row.

use serde::Serialize;

use funclib_io::TabularData;

use crate::normalize::normalize_header;

/// One documented function, ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionRecord {
    pub step: String,
    pub section: String,
    pub option1: String,
    pub option2: String,
    pub description: String,
    pub code: String,
    pub preview_markup: String,
}

impl FunctionRecord {
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|f| f.is_empty())
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> [&str; 7] {
        [
            self.step.as_str(),
            self.section.as_str(),
            self.option1.as_str(),
            self.option2.as_str(),
            self.description.as_str(),
            self.code.as_str(),
            self.preview_markup.as_str(),
        ]
    }
}

/// Logical fields a column can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Step,
    Section,
    Description,
    Code,
    PreviewMarkup,
    Option1,
    Option2,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Step,
        Field::Section,
        Field::Description,
        Field::Code,
        Field::PreviewMarkup,
        Field::Option1,
        Field::Option2,
    ];

    /// Recognized header titles, already in normalized form.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Step => &["step_id", "step id", "step", "ステップ"],
            Field::Section => &["section", "セクション"],
            Field::Description => &["description", "説明"],
            Field::Code => &["script", "code"],
            Field::PreviewMarkup => &["image", "html", "画像"],
            Field::Option1 => &["option1", "option 1", "オプション1"],
            Field::Option2 => &["option2", "option 2", "オプション2"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Step => "step",
            Field::Section => "section",
            Field::Description => "description",
            Field::Code => "code",
            Field::PreviewMarkup => "preview",
            Field::Option1 => "option1",
            Field::Option2 => "option2",
        }
    }
}

/// Column index chosen for each field, `None` when the tab lacks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeaderMatch {
    pub step: Option<usize>,
    pub section: Option<usize>,
    pub description: Option<usize>,
    pub code: Option<usize>,
    pub preview_markup: Option<usize>,
    pub option1: Option<usize>,
    pub option2: Option<usize>,
}

impl HeaderMatch {
    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Step => self.step,
            Field::Section => self.section,
            Field::Description => self.description,
            Field::Code => self.code,
            Field::PreviewMarkup => self.preview_markup,
            Field::Option1 => self.option1,
            Field::Option2 => self.option2,
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Step => &mut self.step,
            Field::Section => &mut self.section,
            Field::Description => &mut self.description,
            Field::Code => &mut self.code,
            Field::PreviewMarkup => &mut self.preview_markup,
            Field::Option1 => &mut self.option1,
            Field::Option2 => &mut self.option2,
        }
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|&f| self.get(f).is_none())
    }
}

/// Match each field to the first header (left to right) whose normalized
/// form is one of its synonyms.
pub fn match_headers(headers: &[String]) -> HeaderMatch {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let mut matched = HeaderMatch::default();
    for field in Field::ALL {
        let synonyms = field.synonyms();
        *matched.slot(field) = normalized.iter().position(|h| synonyms.contains(&h.as_str()));
    }
    matched
}

/// Result of mapping one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappedTable {
    pub records: Vec<FunctionRecord>,
    pub matched: HeaderMatch,
}

/// Map every data row through the header match, dropping all-empty records.
pub fn map_rows(table: &TabularData) -> MappedTable {
    if table.is_empty() {
        return MappedTable::default();
    }

    let matched = table.headers().map(match_headers).unwrap_or_default();

    let records = (0..table.row_count())
        .map(|row| {
            let read = |col: Option<usize>| col.map(|c| table.cell(row, c).to_string()).unwrap_or_default();
            FunctionRecord {
                step: read(matched.step),
                section: read(matched.section),
                option1: read(matched.option1),
                option2: read(matched.option2),
                description: read(matched.description),
                code: read(matched.code),
                preview_markup: read(matched.preview_markup),
            }
        })
        .filter(|record| !record.is_empty())
        .collect();

    MappedTable { records, matched }
}
