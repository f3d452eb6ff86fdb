//! `frag render` command implementation.

use std::io::Read;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use frag_config::{CliSettings, Config, ExtractionConfig, Mode};
use frag_extract::Extractor;

use crate::error::CliError;
use crate::output::Output;

/// Which renderings to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum RenderMode {
    /// All fragments, colored drafts included.
    All,
    /// Approved fragments only.
    Approved,
    /// Both renderings, one after the other.
    Both,
}

/// Arguments for the render command.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct RenderArgs {
    /// Storage-format page body to read (default: stdin).
    file: Option<PathBuf>,

    /// Fragments to render (overrides config).
    #[arg(short, long, value_enum)]
    mode: Option<RenderMode>,

    /// Path to configuration file (default: auto-discover frag.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render tables as plain text.
    #[arg(long)]
    no_tables: bool,

    /// Render lists as plain text.
    #[arg(long)]
    no_lists: bool,

    /// Render headings as plain text.
    #[arg(long)]
    no_headers: bool,

    /// Leave `<...>` placeholders as written.
    #[arg(long)]
    no_clean_brackets: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if the config or the input cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let markup = self.read_input()?;
        if markup.trim().is_empty() {
            output.warning("Input is empty");
        }

        match self.mode {
            Some(RenderMode::Both) => {
                let (all, approved) = render_both(&config.extraction, &markup);
                output.section("all")?;
                output.text(&all)?;
                output.text("")?;
                output.section("approved")?;
                output.text(&approved)?;
            }
            _ => {
                tracing::info!(mode = %config.extraction.mode, "Rendering");
                let extractor = Extractor::new(config.extraction.to_policy());
                output.text(&extractor.extract(&markup))?;
            }
        }

        Ok(())
    }

    /// Settings given on the command line. `both` leaves the mode to the caller.
    fn cli_settings(&self) -> CliSettings {
        let mode = match self.mode {
            Some(RenderMode::All) => Some(Mode::All),
            Some(RenderMode::Approved) => Some(Mode::Approved),
            Some(RenderMode::Both) | None => None,
        };
        CliSettings {
            mode,
            format_tables: self.no_tables.then_some(false),
            format_lists: self.no_lists.then_some(false),
            format_headers: self.no_headers.then_some(false),
            clean_brackets: self.no_clean_brackets.then_some(false),
        }
    }

    fn read_input(&self) -> Result<String, CliError> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            }),
            None => {
                let mut markup = String::new();
                std::io::stdin().read_to_string(&mut markup)?;
                Ok(markup)
            }
        }
    }
}

/// Render the all and approved views with the configured formatting.
fn render_both(extraction: &ExtractionConfig, markup: &str) -> (String, String) {
    let all = Extractor::new(extraction.policy_for(Mode::All)).extract(markup);
    let approved = Extractor::new(extraction.policy_for(Mode::Approved)).extract(markup);
    (all, approved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(mode: Option<RenderMode>) -> RenderArgs {
        RenderArgs {
            file: None,
            mode,
            config: None,
            no_tables: false,
            no_lists: false,
            no_headers: false,
            no_clean_brackets: false,
            verbose: false,
        }
    }

    #[test]
    fn test_cli_settings_from_flags() {
        let args = RenderArgs {
            no_tables: true,
            no_clean_brackets: true,
            ..args(Some(RenderMode::All))
        };

        let settings = args.cli_settings();

        assert_eq!(settings.mode, Some(Mode::All));
        assert_eq!(settings.format_tables, Some(false));
        assert_eq!(settings.format_lists, None);
        assert_eq!(settings.format_headers, None);
        assert_eq!(settings.clean_brackets, Some(false));
    }

    #[test]
    fn test_both_mode_does_not_override_config() {
        assert_eq!(args(Some(RenderMode::Both)).cli_settings().mode, None);
        assert_eq!(args(None).cli_settings().mode, None);
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.xml");
        std::fs::write(&path, "<p>Текст</p>").unwrap();
        let args = RenderArgs {
            file: Some(path),
            ..args(None)
        };

        assert_eq!(args.read_input().unwrap(), "<p>Текст</p>");
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let args = RenderArgs {
            file: Some(PathBuf::from("/nonexistent/page.xml")),
            ..args(None)
        };

        let err = args.read_input().unwrap_err();

        assert!(err.to_string().contains("/nonexistent/page.xml"));
    }

    #[test]
    fn test_render_both_views() {
        let markup = r#"<p>Готово <span style="color: red;">черновик</span></p>"#;
        let (all, approved) = render_both(&ExtractionConfig::default(), markup);
        assert_eq!(all, "Готово черновик");
        assert_eq!(approved, "Готово");
    }
}
