//! Library session: the context object for one user's browsing session.
//!
//! Owns the sheet source, the tab cache and the cache-bust token. Every
//! operation goes through the cache; `refresh()` is the only way to
//! invalidate it and always drops everything.
//!
//! A full pass (`load_all`) is sequential in index order. Failing to read
//! the index aborts the pass; a single tab that fails to load becomes an
//! error panel and the remaining tabs still load.

use std::sync::Arc;
use std::time::Duration;

use funclib_io::{SheetSource, TabularData};

use crate::cache::{CacheKey, Clock, SystemClock, TimeBoxedCache};
use crate::error::LibraryError;
use crate::index;
use crate::mapper::{self, FunctionRecord, HeaderMatch};
use crate::preview;
use crate::view::{self, RecordId};

/// Knobs the session needs from configuration.
#[derive(Debug, Clone)]
pub struct LibraryOptions {
    pub index_tab: String,
    pub index_column: Option<usize>,
    pub ttl: Duration,
    pub truncate_columns: Vec<String>,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            index_tab: "Index".to_string(),
            index_column: None,
            ttl: Duration::from_secs(60),
            truncate_columns: vec!["script".to_string(), "code".to_string()],
        }
    }
}

/// One tab, fetched and mapped.
#[derive(Debug, Clone)]
pub struct LoadedTab {
    pub name: String,
    pub records: Vec<FunctionRecord>,
    /// Parallel to `records`
    pub ids: Vec<RecordId>,
    /// Which column each field was read from
    pub matched: HeaderMatch,
    pub raw: Arc<TabularData>,
}

/// A tab as shown in a full pass: either its content or why it failed.
#[derive(Debug, Clone)]
pub struct TabPanel {
    pub name: String,
    pub outcome: Result<LoadedTab, LibraryError>,
}

pub struct Library<S, C = SystemClock> {
    source: S,
    options: LibraryOptions,
    cache: TimeBoxedCache<CacheKey, Arc<TabularData>, C>,
    bust: Option<String>,
    last_bust_micros: i64,
}

impl<S: SheetSource> Library<S, SystemClock> {
    pub fn new(source: S, options: LibraryOptions) -> Self {
        Self::with_clock(source, options, SystemClock)
    }
}

impl<S: SheetSource, C: Clock> Library<S, C> {
    pub fn with_clock(source: S, options: LibraryOptions, clock: C) -> Self {
        let cache = TimeBoxedCache::with_clock(options.ttl, clock);
        Self {
            source,
            options,
            cache,
            bust: None,
            last_bust_micros: 0,
        }
    }

    /// Current cache-bust token; `None` until the first refresh.
    pub fn bust_token(&self) -> Option<&str> {
        self.bust.as_deref()
    }

    /// Number of cached tab fetches.
    pub fn cached_tabs(&self) -> usize {
        self.cache.len()
    }

    fn fetch(&mut self, tab: &str, with_header: bool) -> Result<Arc<TabularData>, LibraryError> {
        let key = CacheKey::new(tab, with_header, self.bust.as_deref());
        let source = &self.source;
        let bust = self.bust.as_deref();
        let table = self.cache.get_or_try_insert_with(key, || {
            log::debug!("cache miss for tab '{}' (header: {})", tab, with_header);
            source.fetch(tab, with_header, bust).map(Arc::new)
        })?;
        Ok(table)
    }

    /// Tab names listed in the index tab, in document order.
    pub fn resolve_tab_names(&mut self) -> Result<Vec<String>, LibraryError> {
        let index_tab = self.options.index_tab.clone();
        let table = self.fetch(&index_tab, false)?;
        let names = index::resolve_tab_names(&table, self.options.index_column)?;
        log::info!("index '{}' lists {} tab(s)", index_tab, names.len());
        Ok(names)
    }

    /// Fetch one tab with headers and map it onto records.
    pub fn load_tab(&mut self, name: &str) -> Result<LoadedTab, LibraryError> {
        let raw = self.fetch(name, true)?;
        let mapped = mapper::map_rows(&raw);
        if mapped.matched.is_empty() && !raw.is_empty() {
            log::warn!("tab '{}' has no recognized column headers", name);
        }
        let ids = view::assign_ids(name, &mapped.records);

        Ok(LoadedTab {
            name: name.to_string(),
            records: mapped.records,
            ids,
            matched: mapped.matched,
            raw,
        })
    }

    /// Resolve the index, then load every listed tab in order.
    pub fn load_all(&mut self) -> Result<Vec<TabPanel>, LibraryError> {
        let purged = self.cache.purge_expired();
        if purged > 0 {
            log::debug!("dropped {} expired tab(s) from the cache", purged);
        }
        let names = self.resolve_tab_names()?;
        let panels = names
            .into_iter()
            .map(|name| {
                let outcome = self.load_tab(&name);
                if let Err(e) = &outcome {
                    log::warn!("tab '{}' failed to load: {}", name, e);
                }
                TabPanel { name, outcome }
            })
            .collect();
        Ok(panels)
    }

    /// Raw table of a tab with code-like columns shortened for display.
    pub fn preview(&mut self, name: &str, max_len: usize) -> Result<TabularData, LibraryError> {
        let raw = self.fetch(name, true)?;
        Ok(preview::truncate_table(&raw, &self.options.truncate_columns, max_len))
    }

    /// New bust token plus a full cache clear. The next pass refetches
    /// every tab.
    pub fn refresh(&mut self) {
        let now = chrono::Utc::now().timestamp_micros();
        let micros = now.max(self.last_bust_micros + 1);
        self.last_bust_micros = micros;
        self.bust = Some(format!("{}.{:06}", micros / 1_000_000, micros % 1_000_000));
        self.cache.clear();
        log::info!("refreshed; cache-bust token {}", self.bust.as_deref().unwrap_or(""));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{FakeSource, ManualClock};
    use funclib_io::FetchError;

    fn source() -> FakeSource {
        FakeSource::new()
            .tab("Index", &[&["Tabs"], &["", ""], &["Alpha"], &["Beta"]])
            .tab("Alpha", &[&["Step_ID", "説明", "Code"], &["S1", "does a thing", "print(1)"], &["", "", ""]])
            .tab("Beta", &[&["step", "section"], &["B1", "core"], &["B2", "extra"]])
    }

    fn library(src: &FakeSource, clock: &ManualClock) -> Library<FakeSource, ManualClock> {
        Library::with_clock(src.clone(), LibraryOptions::default(), clock.clone())
    }

    #[test]
    fn test_resolve_reads_index_without_header() {
        let src = source();
        let mut lib = library(&src, &ManualClock::new());

        assert_eq!(lib.resolve_tab_names().unwrap(), vec!["Alpha", "Beta"]);
        assert_eq!(src.calls()[0].tab, "Index");
        assert!(!src.calls()[0].with_header);
        assert_eq!(src.calls()[0].bust, None);
    }

    #[test]
    fn test_load_tab_maps_records() {
        let src = source();
        let mut lib = library(&src, &ManualClock::new());

        let tab = lib.load_tab("Alpha").unwrap();

        assert_eq!(tab.records.len(), 1);
        assert_eq!(tab.records[0].step, "S1");
        assert_eq!(tab.records[0].code, "print(1)");
        assert_eq!(tab.ids.len(), 1);
        assert_eq!(tab.matched.code, Some(2));
        assert_eq!(tab.raw.row_count(), 2);
    }

    #[test]
    fn test_repeat_pass_served_from_cache_until_ttl() {
        let src = source();
        let clock = ManualClock::new();
        let mut lib = library(&src, &clock);

        lib.load_all().unwrap();
        clock.advance(Duration::from_secs(59));
        lib.load_all().unwrap();
        assert_eq!(src.calls().len(), 3);

        clock.advance(Duration::from_secs(2));
        lib.load_all().unwrap();
        assert_eq!(src.calls().len(), 6);
    }

    #[test]
    fn test_full_pass_drops_expired_tabs_no_longer_listed() {
        let src = source();
        let clock = ManualClock::new();
        let mut lib = library(&src, &clock);

        lib.load_all().unwrap();
        assert_eq!(lib.cached_tabs(), 3);

        src.set_tab("Index", &[&["Tabs"], &["Alpha"]]);
        clock.advance(Duration::from_secs(61));
        lib.load_all().unwrap();

        assert_eq!(lib.cached_tabs(), 2, "stale Beta entry is purged");
    }

    #[test]
    fn test_refresh_sets_new_token_and_refetches() {
        let src = source();
        let mut lib = library(&src, &ManualClock::new());

        lib.load_all().unwrap();
        assert_eq!(lib.bust_token(), None);

        lib.refresh();
        let first = lib.bust_token().unwrap().to_string();
        assert_eq!(lib.cached_tabs(), 0);
        lib.load_all().unwrap();

        assert_eq!(src.calls_for("Alpha"), 2);
        assert!(src.calls()[3..].iter().all(|c| c.bust.as_deref() == Some(first.as_str())));

        lib.refresh();
        assert_ne!(lib.bust_token().unwrap(), first, "tokens must be unique across refreshes");
    }

    #[test]
    fn test_one_broken_tab_does_not_abort_pass() {
        let src = source()
            .tab("Index", &[&["Tabs"], &["Alpha"], &["Broken"], &["Beta"]])
            .failing("Broken", FetchError::Http(500, "oops".into()));
        let mut lib = library(&src, &ManualClock::new());

        let panels = lib.load_all().unwrap();

        assert_eq!(panels.len(), 3);
        assert!(panels[0].outcome.is_ok());
        assert_eq!(
            panels[1].outcome.as_ref().unwrap_err(),
            &LibraryError::Fetch(FetchError::Http(500, "oops".into()))
        );
        assert_eq!(panels[2].outcome.as_ref().unwrap().records.len(), 2);
    }

    #[test]
    fn test_index_failure_aborts_pass() {
        let src = FakeSource::new().tab("Index", &[&["Only a header"]]);
        let mut lib = library(&src, &ManualClock::new());

        let err = lib.load_all().unwrap_err();
        assert!(err.is_index_problem());
        assert_eq!(src.calls().len(), 1);
    }

    #[test]
    fn test_missing_index_tab_is_fetch_error() {
        let src = FakeSource::new();
        let mut lib = library(&src, &ManualClock::new());

        let err = lib.resolve_tab_names().unwrap_err();
        assert!(matches!(err, LibraryError::Fetch(_)));
        assert!(!err.is_index_problem());
    }

    #[test]
    fn test_failed_fetch_not_cached() {
        let src = FakeSource::new().failing("Alpha", FetchError::Network("down".into()));
        let mut lib = library(&src, &ManualClock::new());

        assert!(lib.load_tab("Alpha").is_err());
        src.set_tab("Alpha", &[&["step"], &["recovered"]]);
        let tab = lib.load_tab("Alpha").unwrap();

        assert_eq!(tab.records[0].step, "recovered");
        assert_eq!(src.calls_for("Alpha"), 2);
    }

    #[test]
    fn test_duplicate_tab_names_render_twice_from_one_fetch() {
        let src = source().tab("Index", &[&["Tabs"], &["Beta"], &["Beta"]]);
        let mut lib = library(&src, &ManualClock::new());

        let panels = lib.load_all().unwrap();

        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].name, panels[1].name);
        assert_eq!(src.calls_for("Beta"), 1);
    }

    #[test]
    fn test_forced_index_column() {
        let src = FakeSource::new()
            .tab("Index", &[&["A", "B"], &["Left", "Right"]])
            .tab("Right", &[&["step"], &["r"]]);
        let options = LibraryOptions {
            index_column: Some(1),
            ..LibraryOptions::default()
        };
        let mut lib = Library::with_clock(src.clone(), options, ManualClock::new());

        assert_eq!(lib.resolve_tab_names().unwrap(), vec!["Right"]);
    }

    #[test]
    fn test_preview_truncates_code_columns_only() {
        let long = "x".repeat(50);
        let src = FakeSource::new().tab("T", &[&["Step", "Code"], &[long.as_str(), long.as_str()]]);
        let mut lib = library(&src, &ManualClock::new());

        let shown = lib.preview("T", 10).unwrap();

        assert_eq!(shown.cell(0, 0), long);
        assert_eq!(shown.cell(0, 1), "xxxxxxxxx…");
        // preview and load_tab share the cached fetch
        lib.load_tab("T").unwrap();
        assert_eq!(src.calls_for("T"), 1);
    }
}
