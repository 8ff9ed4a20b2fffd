// Application settings
// Loaded from ~/.config/funclib/settings.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Public export host for the spreadsheet service.
pub const DEFAULT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Environment variable consulted when no password is set in the file.
pub const PASSWORD_ENV: &str = "APP_PASSWORD";

/// Where the function library lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Spreadsheet document identifier
    pub id: String,

    /// Export host; the document id is appended as a path segment
    pub base_url: String,

    /// Tab that lists every other tab to load
    pub index_tab: String,

    /// Force the index column (0 = A, 1 = B, ...); None = auto-detect
    pub index_column: Option<usize>,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            index_tab: "Index".to_string(),
            index_column: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds a fetched tab stays fresh
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

/// Raw table preview tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Normalized header names whose cells get shortened
    pub truncate_columns: Vec<String>,

    /// Maximum characters per truncated cell (ellipsis included)
    pub max_len: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            truncate_columns: vec!["script".to_string(), "code".to_string()],
            max_len: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Shared secret. Falls back to $APP_PASSWORD when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sheet: SheetSettings,
    pub cache: CacheSettings,
    pub preview: PreviewSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("funclib")
            .join("settings.toml")
    }

    /// Load settings from the default location.
    ///
    /// A missing file yields defaults. A file that exists but cannot be
    /// read or parsed is an error: it may carry the gate password, so it
    /// is never silently replaced by defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_or_default(&Self::config_path())
    }

    fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    /// Load settings from an explicit path. Errors are returned, not swallowed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {}", path.display(), msg)),
                other => other,
            })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check the values the pipeline cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.id.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet.id is not set".into()));
        }
        if self.sheet.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet.base_url is empty".into()));
        }
        if self.sheet.index_tab.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet.index_tab is empty".into()));
        }
        if self.sheet.timeout_secs == 0 {
            return Err(ConfigError::Invalid("sheet.timeout_secs must be at least 1".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be at least 1".into()));
        }
        if self.preview.max_len == 0 {
            return Err(ConfigError::Invalid("preview.max_len must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolve the gate secret: file value first, then $APP_PASSWORD.
    /// Blank values count as unset.
    pub fn effective_password(&self) -> Option<String> {
        self.password_with_env(std::env::var(PASSWORD_ENV).ok())
    }

    fn password_with_env(&self, env_value: Option<String>) -> Option<String> {
        self.auth
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| env_value.filter(|p| !p.is_empty()))
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
