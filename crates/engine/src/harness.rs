//! Test doubles: a hand-cranked clock and an in-memory sheet source.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use funclib_io::{FetchError, SheetSource, TabularData};

use crate::cache::Clock;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

/// One recorded `fetch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub tab: String,
    pub with_header: bool,
    pub bust: Option<String>,
}

/// In-memory tabs keyed by name. Clones share tabs and the call log.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    tabs: Rc<RefCell<HashMap<String, Result<Vec<Vec<String>>, FetchError>>>>,
    calls: Rc<RefCell<Vec<FetchCall>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tab as raw records (first record is the header row when
    /// fetched with a header).
    pub fn tab(self, name: &str, records: &[&[&str]]) -> Self {
        self.set_tab(name, records);
        self
    }

    pub fn set_tab(&self, name: &str, records: &[&[&str]]) {
        let records = records
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self.tabs.borrow_mut().insert(name.to_string(), Ok(records));
    }

    pub fn failing(self, name: &str, err: FetchError) -> Self {
        self.tabs.borrow_mut().insert(name.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_for(&self, tab: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.tab == tab).count()
    }
}

impl SheetSource for FakeSource {
    fn fetch(&self, tab: &str, with_header: bool, bust: Option<&str>) -> Result<TabularData, FetchError> {
        self.calls.borrow_mut().push(FetchCall {
            tab: tab.to_string(),
            with_header,
            bust: bust.map(str::to_string),
        });

        let records = match self.tabs.borrow().get(tab) {
            Some(Ok(records)) => records.clone(),
            Some(Err(e)) => return Err(e.clone()),
            None => return Err(FetchError::Http(400, format!("no tab named {tab}"))),
        };

        if !with_header {
            return Ok(TabularData::positional(records));
        }
        let mut records = records.into_iter();
        let headers = records.next().unwrap_or_default();
        Ok(TabularData::with_headers(headers, records.collect()))
    }
}
