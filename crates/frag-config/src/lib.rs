//! Configuration management for frag.
//!
//! Parses `frag.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [extraction]
//! mode = "approved"        # "all" | "approved"
//! format_tables = true
//! format_lists = true
//! format_headers = true
//! clean_brackets = true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use frag_extract::ExtractionPolicy;
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "frag.toml";

/// Which fragments an extraction keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Every fragment, colored drafts included.
    All,
    /// Approved fragments only.
    #[default]
    Approved,
}

impl Mode {
    /// Name used in `frag.toml` and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "approved" => Ok(Self::Approved),
            other => Err(ConfigError::Validation(format!(
                "extraction.mode must be \"all\" or \"approved\", got \"{other}\""
            ))),
        }
    }
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override extraction mode.
    pub mode: Option<Mode>,
    /// Override table formatting.
    pub format_tables: Option<bool>,
    /// Override list formatting.
    pub format_lists: Option<bool>,
    /// Override heading formatting.
    pub format_headers: Option<bool>,
    /// Override placeholder cleanup.
    pub clean_brackets: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction settings as written in TOML.
    #[serde(rename = "extraction")]
    extraction_raw: ExtractionConfigRaw,

    /// Resolved extraction settings (set after loading).
    #[serde(skip)]
    pub extraction: ExtractionConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw extraction configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractionConfigRaw {
    mode: Option<String>,
    format_tables: Option<bool>,
    format_lists: Option<bool>,
    format_headers: Option<bool>,
    clean_brackets: Option<bool>,
}

/// Resolved extraction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExtractionConfig {
    /// Which fragments to keep.
    pub mode: Mode,
    /// Render tables as pipe rows.
    pub format_tables: bool,
    /// Render lists with markers and indentation.
    pub format_lists: bool,
    /// Render headings with `#` prefixes.
    pub format_headers: bool,
    /// Repair spacing inside `<...>` placeholders.
    pub clean_brackets: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            format_tables: true,
            format_lists: true,
            format_headers: true,
            clean_brackets: true,
        }
    }
}

impl ExtractionConfig {
    /// Extraction policy for the configured mode.
    #[must_use]
    pub fn to_policy(&self) -> ExtractionPolicy {
        self.policy_for(self.mode)
    }

    /// Extraction policy for an explicit mode, with the configured formatting.
    #[must_use]
    pub fn policy_for(&self, mode: Mode) -> ExtractionPolicy {
        let base = match mode {
            Mode::All => ExtractionPolicy::all(),
            Mode::Approved => ExtractionPolicy::approved(),
        };
        base.with_tables(self.format_tables)
            .with_lists(self.format_lists)
            .with_headers(self.format_headers)
            .with_clean_brackets(self.clean_brackets)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `frag.toml` in current directory and parents.
    /// Without a file, defaults are used.
    ///
    /// CLI settings are applied last and take precedence over file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let discovered = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => std::env::current_dir()
                .ok()
                .and_then(|cwd| discover_config(&cwd)),
        };

        let mut config = match discovered {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Parse configuration from TOML text and resolve it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for invalid TOML and
    /// `ConfigError::Validation` for invalid values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(mode) = settings.mode {
            self.extraction.mode = mode;
        }
        if let Some(format_tables) = settings.format_tables {
            self.extraction.format_tables = format_tables;
        }
        if let Some(format_lists) = settings.format_lists {
            self.extraction.format_lists = format_lists;
        }
        if let Some(format_headers) = settings.format_headers {
            self.extraction.format_headers = format_headers;
        }
        if let Some(clean_brackets) = settings.clean_brackets {
            self.extraction.clean_brackets = clean_brackets;
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Fill resolved settings from the raw TOML values, validating the mode.
    fn resolve(&mut self) -> Result<(), ConfigError> {
        let raw = &self.extraction_raw;
        let defaults = ExtractionConfig::default();

        let mode = match raw.mode.as_deref() {
            Some(mode) => mode.parse()?,
            None => defaults.mode,
        };
        self.extraction = ExtractionConfig {
            mode,
            format_tables: raw.format_tables.unwrap_or(defaults.format_tables),
            format_lists: raw.format_lists.unwrap_or(defaults.format_lists),
            format_headers: raw.format_headers.unwrap_or(defaults.format_headers),
            clean_brackets: raw.clean_brackets.unwrap_or(defaults.clean_brackets),
        };
        Ok(())
    }
}

/// Search for `frag.toml` in `start` and its parents.
#[must_use]
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
