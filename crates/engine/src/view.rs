//! Per-record display state.
//!
//! Each card shows one of three renderings. The choice is keyed by a
//! content-derived [`RecordId`] rather than by position, so it survives
//! filtering and re-ordering and is dropped when the record disappears.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::mapper::FunctionRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Description,
    Code,
    Preview,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Description => "description",
            DisplayMode::Code => "code",
            DisplayMode::Preview => "preview",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "description" | "desc" | "説明" => Ok(DisplayMode::Description),
            "code" | "script" => Ok(DisplayMode::Code),
            "preview" | "prev" | "html" => Ok(DisplayMode::Preview),
            other => Err(format!("unknown display mode '{}' (expected description, code or preview)", other)),
        }
    }
}

/// Stable identity of a record within a tab.
///
/// blake3 over the tab name, every field (length-prefixed) and an
/// occurrence ordinal, so two byte-identical records still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(blake3::Hash);

impl RecordId {
    pub fn compute(tab: &str, record: &FunctionRecord, occurrence: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in std::iter::once(tab).chain(record.fields()) {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.update(&occurrence.to_le_bytes());
        RecordId(hasher.finalize())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl Serialize for RecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.to_hex().as_str())
    }
}

/// Ids for a tab's records, in the same order.
pub fn assign_ids(tab: &str, records: &[FunctionRecord]) -> Vec<RecordId> {
    let mut seen: HashMap<&FunctionRecord, u32> = HashMap::new();
    records
        .iter()
        .map(|record| {
            let occurrence = seen.entry(record).or_insert(0);
            let id = RecordId::compute(tab, record, *occurrence);
            *occurrence += 1;
            id
        })
        .collect()
}

/// Display mode per record; records never touched show their description.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    modes: HashMap<RecordId, DisplayMode>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self, id: &RecordId) -> DisplayMode {
        self.modes.get(id).copied().unwrap_or_default()
    }

    pub fn set_mode(&mut self, id: RecordId, mode: DisplayMode) {
        if mode == DisplayMode::default() {
            self.modes.remove(&id);
        } else {
            self.modes.insert(id, mode);
        }
    }

    /// Forget state for records that are no longer present.
    pub fn retain<'a>(&mut self, live: impl IntoIterator<Item = &'a RecordId>) {
        let live: HashSet<&RecordId> = live.into_iter().collect();
        self.modes.retain(|id, _| live.contains(id));
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
