// funclib CLI - browse a spreadsheet-hosted function library from the terminal

mod browse;
mod exit_codes;
mod gate;
mod render;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use funclib_config::{ConfigError, Settings};
use funclib_engine::{DisplayMode, Library, LibraryError, LibraryOptions};
use funclib_io::{CsvFetcher, SheetSource};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_INDEX, EXIT_SUCCESS, EXIT_TAB, EXIT_USAGE};

/// Shown instead of the underlying cause when the index tab is unusable.
pub const INDEX_UNREADABLE: &str = "couldn't read the tab list from the index sheet";
const INDEX_HINT: &str = "make sure the index tab exists and has tab names from row 2 downward (any column)";

#[derive(Parser)]
#[command(name = "funclib")]
#[command(about = "Browse a spreadsheet-hosted function library (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.config/funclib/settings.toml)
    #[arg(long, global = true, env = "FUNCLIB_CONFIG")]
    config: Option<PathBuf>,

    /// Spreadsheet id, overrides sheet.id
    #[arg(long, global = true, env = "FUNCLIB_SHEET_ID")]
    sheet_id: Option<String>,

    /// Password for the gate; prompted on stdin when omitted
    #[arg(long, global = true, env = "FUNCLIB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// More logging (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tabs named in the index tab
    Tabs {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show one tab as cards
    #[command(after_help = "\
Examples:
  funclib show Basics
  funclib show Basics --search loop --mode code
  funclib show Basics --format json")]
    Show {
        /// Tab name as written in the index
        tab: String,

        /// Case-insensitive filter on step, section and description
        #[arg(long, short = 'q')]
        search: Option<String>,

        /// Card body: description, code or preview
        #[arg(long, default_value = "description", value_parser = parse_mode)]
        mode: DisplayMode,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Raw table of one tab with code columns shortened
    Preview {
        tab: String,

        /// Maximum characters per shortened cell (default: preview.max_len)
        #[arg(long)]
        max_len: Option<usize>,

        #[arg(long, value_enum, default_value_t = TableFormat::Text)]
        format: TableFormat,
    },

    /// Every tab in index order, like the full page
    Render {
        #[arg(long, short = 'q')]
        search: Option<String>,

        #[arg(long, default_value = "description", value_parser = parse_mode)]
        mode: DisplayMode,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Interactive session that keeps its cache between commands
    Browse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Text,
    Csv,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn parse_mode(s: &str) -> Result<DisplayMode, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(&cli)?;

    // Nothing is validated or fetched until the gate passes
    let secret = settings.effective_password();
    gate::check(secret.as_deref(), cli.password.clone(), || {
        gate::prompt_line(&mut io::stdin().lock())
    })?;

    settings.validate().map_err(CliError::config)?;

    let fetcher = CsvFetcher::with_base_url(
        &settings.sheet.base_url,
        &settings.sheet.id,
        Duration::from_secs(settings.sheet.timeout_secs),
    )
    .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot set up HTTP client: {}", e)))?;

    let options = LibraryOptions {
        index_tab: settings.sheet.index_tab.clone(),
        index_column: settings.sheet.index_column,
        ttl: Duration::from_secs(settings.cache.ttl_secs),
        truncate_columns: settings.preview.truncate_columns.clone(),
    };
    let mut library = Library::new(fetcher, options);

    match cli.command {
        Commands::Tabs { format } => cmd_tabs(&mut library, format),
        Commands::Show { tab, search, mode, format } => {
            cmd_show(&mut library, &tab, search.as_deref().unwrap_or(""), mode, format)
        }
        Commands::Preview { tab, max_len, format } => {
            let max_len = max_len.unwrap_or(settings.preview.max_len);
            if max_len == 0 {
                return Err(CliError::args("--max-len must be at least 1"));
            }
            cmd_preview(&mut library, &tab, max_len, format)
        }
        Commands::Render { search, mode, format } => {
            cmd_render(&mut library, search.as_deref().unwrap_or(""), mode, format)
        }
        Commands::Browse => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            browse::run(library, settings.preview.max_len, &mut stdin.lock(), &mut stdout.lock())
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_path(path).map_err(CliError::config)?,
        None => Settings::load().map_err(CliError::config)?,
    };
    if let Some(id) = &cli.sheet_id {
        settings.sheet.id = id.clone();
    }
    Ok(settings)
}

fn io_error(e: io::Error) -> CliError {
    CliError::io(e.to_string())
}

fn write_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| CliError::io(e.to_string()))?;
    writeln!(out).map_err(io_error)
}

// ============================================================================
// tabs
// ============================================================================

fn cmd_tabs<S: SheetSource>(library: &mut Library<S>, format: OutputFormat) -> Result<(), CliError> {
    let names = library.resolve_tab_names().map_err(CliError::index)?;

    match format {
        OutputFormat::Json => write_json(&names),
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for name in &names {
                writeln!(out, "{}", name).map_err(io_error)?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// show
// ============================================================================

fn cmd_show<S: SheetSource>(
    library: &mut Library<S>,
    tab: &str,
    query: &str,
    mode: DisplayMode,
    format: OutputFormat,
) -> Result<(), CliError> {
    let loaded = library.load_tab(tab).map_err(|e| CliError::tab(tab, &e))?;

    match format {
        OutputFormat::Json => write_json(&render::JsonPanel::loaded(&loaded, query, mode)),
        OutputFormat::Text => {
            let stdout = io::stdout();
            render::write_panel(&mut stdout.lock(), &loaded, query, |_| mode).map_err(io_error)
        }
    }
}

// ============================================================================
// preview
// ============================================================================

fn cmd_preview<S: SheetSource>(
    library: &mut Library<S>,
    tab: &str,
    max_len: usize,
    format: TableFormat,
) -> Result<(), CliError> {
    let table = library.preview(tab, max_len).map_err(|e| CliError::tab(tab, &e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        TableFormat::Text => render::write_table(&mut out, &table).map_err(io_error),
        TableFormat::Csv => {
            render::write_table_csv(&mut out, &table).map_err(|e| CliError::io(e.to_string()))
        }
    }
}

// ============================================================================
// render
// ============================================================================

fn cmd_render<S: SheetSource>(
    library: &mut Library<S>,
    query: &str,
    mode: DisplayMode,
    format: OutputFormat,
) -> Result<(), CliError> {
    let panels = library.load_all().map_err(CliError::index)?;

    match format {
        OutputFormat::Json => {
            let json: Vec<_> = panels
                .iter()
                .map(|p| render::JsonPanel::from_panel(p, query, mode))
                .collect();
            write_json(&json)?;
        }
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for panel in &panels {
                let written = match &panel.outcome {
                    Ok(tab) => render::write_panel(&mut out, tab, query, |_| mode),
                    Err(e) => render::write_error_panel(&mut out, &panel.name, e),
                };
                written.map_err(io_error)?;
            }
        }
    }

    let failed = panels.iter().filter(|p| p.outcome.is_err()).count();
    if failed > 0 {
        return Err(CliError::new(
            EXIT_TAB,
            format!("{} of {} tab(s) failed to load", failed, panels.len()),
        ));
    }
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Invalid(_) => format!(
                "edit {} or pass --sheet-id / set FUNCLIB_SHEET_ID",
                Settings::config_path_display()
            ),
            ConfigError::Io(_) | ConfigError::Parse(_) => format!(
                "fix the settings file ({} unless --config is given)",
                Settings::config_path_display()
            ),
        };
        Self::new(EXIT_CONFIG, err.to_string()).with_hint(hint)
    }

    /// Index failures get a generic message; the cause goes to the log.
    pub fn index(err: LibraryError) -> Self {
        log::error!("index tab unreadable: {}", err);
        Self::new(EXIT_INDEX, INDEX_UNREADABLE).with_hint(INDEX_HINT)
    }

    pub fn tab(name: &str, err: &LibraryError) -> Self {
        Self::new(EXIT_TAB, format!("couldn't load tab '{}': {}", name, err))
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
