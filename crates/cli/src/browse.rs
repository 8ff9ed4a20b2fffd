//! `funclib browse`: interactive session.
//!
//! One `Library` lives for the whole loop, so the tab cache, the bust
//! token and each card's display mode persist between commands. Every
//! command re-renders the open tab from (possibly cached) data.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use funclib_engine::filter::filter_indices;
use funclib_engine::{Clock, DisplayMode, Library, LibraryError, LoadedTab, ViewState};
use funclib_io::SheetSource;

use crate::render;
use crate::CliError;

const HELP: &str = "\
commands:
  tabs                      list tabs from the index
  open <n|name>             show a tab
  search [text]             filter the open tab (no text clears)
  mode <n> <mode>           show card n as description, code or preview
  preview                   raw table of the open tab
  refresh                   refetch everything from the sheet
  help                      this text
  quit                      leave";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Tabs,
    Open(String),
    Search(String),
    Mode(usize, DisplayMode),
    Preview,
    Refresh,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match verb.to_lowercase().as_str() {
        "tabs" | "ls" => Ok(Command::Tabs),
        "open" | "o" if !rest.is_empty() => Ok(Command::Open(rest.to_string())),
        "open" | "o" => Err("usage: open <n|name>".into()),
        "search" | "s" | "/" => Ok(Command::Search(rest.to_string())),
        "mode" | "m" => {
            let mut parts = rest.split_whitespace();
            let (Some(n), Some(mode), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err("usage: mode <n> <description|code|preview>".into());
            };
            let n: usize = n.parse().map_err(|_| format!("not a card number: {}", n))?;
            Ok(Command::Mode(n, mode.parse()?))
        }
        "preview" | "p" => Ok(Command::Preview),
        "refresh" | "r" => Ok(Command::Refresh),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}' (try help)", other)),
    }
}

struct Browser<S, C> {
    library: Library<S, C>,
    tabs: Vec<String>,
    /// Name of the open tab
    current: Option<String>,
    /// Search text per tab name
    queries: HashMap<String, String>,
    /// Card display modes per tab name
    views: HashMap<String, ViewState>,
    preview_len: usize,
}

impl<S: SheetSource, C: Clock> Browser<S, C> {
    fn reload_index(&mut self) -> Result<(), LibraryError> {
        match self.library.resolve_tab_names() {
            Ok(tabs) => {
                self.tabs = tabs;
                if let Some(name) = &self.current {
                    if !self.tabs.contains(name) {
                        log::info!("open tab '{}' is no longer in the index", name);
                        self.current = None;
                    }
                }
                let tabs = &self.tabs;
                self.queries.retain(|name, _| tabs.contains(name));
                self.views.retain(|name, _| tabs.contains(name));
                Ok(())
            }
            Err(e) => {
                self.tabs.clear();
                self.current = None;
                Err(e)
            }
        }
    }

    fn select(&self, target: &str) -> Result<String, String> {
        if let Ok(n) = target.parse::<usize>() {
            if let Some(name) = n.checked_sub(1).and_then(|i| self.tabs.get(i)) {
                return Ok(name.clone());
            }
        }
        self.tabs
            .iter()
            .find(|t| *t == target)
            .or_else(|| self.tabs.iter().find(|t| t.eq_ignore_ascii_case(target)))
            .cloned()
            .ok_or_else(|| format!("no tab '{}' (see tabs)", target))
    }

    fn current_tab(&mut self) -> Option<(String, Result<LoadedTab, LibraryError>)> {
        let name = self.current.clone()?;
        let loaded = self.library.load_tab(&name);
        Some((name, loaded))
    }

    fn query(&self, name: &str) -> &str {
        self.queries.get(name).map(String::as_str).unwrap_or("")
    }

    fn show_current(&mut self, out: &mut impl Write) -> std::io::Result<()> {
        let Some((name, loaded)) = self.current_tab() else {
            return writeln!(out, "no tab open (try: open 1)");
        };
        match loaded {
            Ok(tab) => {
                let query = self.queries.get(&name).map(String::as_str).unwrap_or("");
                let view = self.views.entry(name).or_default();
                view.retain(&tab.ids);
                render::write_panel(out, &tab, query, |id| view.mode(id))
            }
            Err(e) => render::write_error_panel(out, &name, &e),
        }
    }

    fn write_tabs(&self, out: &mut impl Write) -> std::io::Result<()> {
        for (i, name) in self.tabs.iter().enumerate() {
            let marker = if self.current.as_ref() == Some(name) { '*' } else { ' ' };
            writeln!(out, "{}{:>3}. {}", marker, i + 1, name)?;
        }
        Ok(())
    }

    fn set_mode(&mut self, card: usize, mode: DisplayMode) -> Result<(), String> {
        let Some((name, loaded)) = self.current_tab() else {
            return Err("no tab open".into());
        };
        let tab = loaded.map_err(|e| e.to_string())?;
        let shown = filter_indices(&tab.records, self.query(&name));
        let record = card
            .checked_sub(1)
            .and_then(|i| shown.get(i))
            .ok_or_else(|| format!("no card #{} (showing {})", card, shown.len()))?;
        self.views
            .entry(name)
            .or_default()
            .set_mode(tab.ids[*record], mode);
        Ok(())
    }

    fn handle(&mut self, cmd: Command, out: &mut impl Write) -> std::io::Result<bool> {
        match cmd {
            Command::Quit => return Ok(false),
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Tabs => self.write_tabs(out)?,
            Command::Open(target) => match self.select(&target) {
                Ok(name) => {
                    self.current = Some(name);
                    self.show_current(out)?;
                }
                Err(msg) => writeln!(out, "{}", msg)?,
            },
            Command::Search(text) => {
                let Some(name) = self.current.clone() else {
                    writeln!(out, "no tab open")?;
                    return Ok(true);
                };
                self.queries.insert(name, text);
                self.show_current(out)?;
            }
            Command::Mode(card, mode) => match self.set_mode(card, mode) {
                Ok(()) => self.show_current(out)?,
                Err(msg) => writeln!(out, "{}", msg)?,
            },
            Command::Preview => {
                let Some(name) = self.current.clone() else {
                    writeln!(out, "no tab open")?;
                    return Ok(true);
                };
                match self.library.preview(&name, self.preview_len) {
                    Ok(table) => render::write_table(out, &table)?,
                    Err(e) => render::write_error_panel(out, &name, &e)?,
                }
            }
            Command::Refresh => {
                self.library.refresh();
                match self.reload_index() {
                    Ok(()) => {
                        writeln!(out, "refreshed: {} tab(s)", self.tabs.len())?;
                        if self.current.is_some() {
                            self.show_current(out)?;
                        }
                    }
                    Err(e) => {
                        log::info!("index unreadable after refresh: {}", e);
                        writeln!(out, "{}", crate::INDEX_UNREADABLE)?;
                    }
                }
            }
        }
        Ok(true)
    }
}

/// Run the loop until `quit` or end of input.
pub fn run<S: SheetSource, C: Clock>(
    library: Library<S, C>,
    preview_len: usize,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut browser = Browser {
        library,
        tabs: Vec::new(),
        current: None,
        queries: HashMap::new(),
        views: HashMap::new(),
        preview_len,
    };

    browser.reload_index().map_err(CliError::index)?;

    let io_err = |e: std::io::Error| CliError::io(e.to_string());
    writeln!(out, "{} tab(s). Type help for commands.", browser.tabs.len()).map_err(io_err)?;
    browser.write_tabs(out).map_err(io_err)?;

    let mut line = String::new();
    loop {
        write!(out, "funclib> ").map_err(io_err)?;
        out.flush().map_err(io_err)?;

        line.clear();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            writeln!(out).map_err(io_err)?;
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(cmd) => {
                if !browser.handle(cmd, out).map_err(io_err)? {
                    return Ok(());
                }
            }
            Err(msg) => writeln!(out, "{}", msg).map_err(io_err)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    use funclib_engine::LibraryOptions;
    use funclib_io::{FetchError, TabularData};

    /// Serves fixed CSV bodies and logs every fetch.
    #[derive(Clone, Default)]
    struct StubSource {
        bodies: Rc<RefCell<HashMap<String, String>>>,
        log: Rc<RefCell<Vec<(String, Option<String>)>>>,
    }

    impl StubSource {
        fn with(self, tab: &str, body: &str) -> Self {
            self.bodies.borrow_mut().insert(tab.into(), body.into());
            self
        }
    }

    impl SheetSource for StubSource {
        fn fetch(&self, tab: &str, with_header: bool, bust: Option<&str>) -> Result<TabularData, FetchError> {
            self.log.borrow_mut().push((tab.to_string(), bust.map(str::to_string)));
            let bodies = self.bodies.borrow();
            // "<tab>@refreshed" stands in for the sheet after an edit
            let body = bust
                .and_then(|_| bodies.get(&format!("{}@refreshed", tab)))
                .or_else(|| bodies.get(tab))
                .cloned();
            match body {
                Some(body) => funclib_io::csv::parse_table(&body, with_header),
                None => Err(FetchError::Http(404, String::new())),
            }
        }
    }

    fn stub() -> StubSource {
        StubSource::default()
            .with("Index", "Tabs\nAlpha\nBeta\n")
            .with("Alpha", "Step,Section,Description,Code\nS1,Core,first,print(1)\nS2,Extra,second,print(2)\n")
            .with("Beta", "Step,Description\nB1,only\n")
    }

    fn session(src: &StubSource, script: &str) -> (Result<(), CliError>, String) {
        let library = Library::new(src.clone(), LibraryOptions::default());
        let mut input = Cursor::new(script.to_string());
        let mut out = Vec::new();
        let result = run(library, 120, &mut input, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("open 2"), Ok(Command::Open("2".into())));
        assert_eq!(parse_command("  OPEN  Funcs A "), Ok(Command::Open("Funcs A".into())));
        assert_eq!(parse_command("search"), Ok(Command::Search(String::new())));
        assert_eq!(parse_command("mode 3 code"), Ok(Command::Mode(3, DisplayMode::Code)));
        assert!(parse_command("mode x code").is_err());
        assert!(parse_command("mode 1").is_err());
        assert!(parse_command("open").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_open_search_and_mode() {
        let src = stub();
        let (result, out) = session(&src, "open Alpha\nsearch extra\nmode 1 code\nquit\n");

        assert!(result.is_ok());
        assert!(out.contains("2 tab(s)"));
        assert!(out.contains("Showing 2/2 items"));
        assert!(out.contains("Showing 1/2 items"));
        assert!(out.contains("   -- code --\n   print(2)"));
    }

    #[test]
    fn test_mode_survives_clearing_search() {
        let src = stub();
        let (_, out) = session(&src, "open 1\nsearch second\nmode 1 code\nsearch\nquit\n");

        // After clearing the search S2 is card #2 and still shows code
        let last_panel = out.rsplit("=== Alpha ===").next().unwrap();
        assert!(last_panel.contains("#2 S2\n   [Extra]\n   -- code --\n   print(2)"));
        assert!(last_panel.contains("#1 S1\n   [Core]\n   -- description --"));
    }

    #[test]
    fn test_repeated_renders_hit_cache_and_refresh_refetches() {
        let src = stub();
        let (_, out) = session(&src, "open 1\nsearch s\nsearch\nrefresh\nquit\n");

        let log = src.log.borrow();
        let alpha: Vec<_> = log.iter().filter(|(t, _)| t == "Alpha").collect();
        assert_eq!(alpha.len(), 2, "one fetch before refresh, one after");
        assert!(alpha[0].1.is_none());
        assert!(alpha[1].1.is_some());
        assert!(out.contains("refreshed: 2 tab(s)"));
    }

    #[test]
    fn test_open_tab_follows_its_name_across_reordering() {
        let src = stub()
            .with("Index@refreshed", "Tabs\nGamma\nAlpha\nBeta\n")
            .with("Gamma", "Step\nG1\n");
        let (_, out) = session(&src, "open 2\nsearch only\nrefresh\ntabs\nquit\n");

        let after = out.split("refreshed: 3 tab(s)").nth(1).unwrap();
        assert!(after.starts_with("\n=== Beta ===\nShowing 1/1 items"), "got: {}", after);
        assert!(!after.contains("=== Alpha ==="));
        assert!(after.contains("*  3. Beta"));
    }

    #[test]
    fn test_open_tab_removed_from_index_is_closed() {
        let src = stub().with("Index@refreshed", "Tabs\nAlpha\n");
        let (_, out) = session(&src, "open Beta\nsearch only\nrefresh\nsearch x\nquit\n");

        let after = out.split("refreshed: 1 tab(s)").nth(1).unwrap();
        assert!(!after.contains("==="));
        assert!(after.contains("no tab open"));
    }

    #[test]
    fn test_missing_tab_shows_error_panel() {
        let src = stub().with("Index", "Tabs\nAlpha\nGhost\n");
        let (result, out) = session(&src, "open Ghost\nopen 1\n");

        assert!(result.is_ok(), "EOF ends the session cleanly");
        assert!(out.contains("=== Ghost ===\nerror: couldn't load this tab: HTTP 404"));
        assert!(out.contains("=== Alpha ==="));
    }

    #[test]
    fn test_unreadable_index_aborts() {
        let src = StubSource::default().with("Index", "Only a header\n");
        let (result, _) = session(&src, "tabs\n");

        let err = result.unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INDEX);
    }
}
