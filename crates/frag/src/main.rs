//! frag CLI - fragment extraction from Confluence pages.
//!
//! Provides commands for:
//! - `render`: Print the all and/or approved rendering of a page body

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::RenderArgs;
use output::Output;

/// frag - Confluence fragment extraction.
#[derive(Parser)]
#[command(name = "frag", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a storage-format page body as text.
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_arguments() {
        let cli = Cli::try_parse_from([
            "frag",
            "render",
            "page.xml",
            "--mode",
            "both",
            "--no-tables",
            "--verbose",
        ])
        .unwrap();

        let Commands::Render(args) = cli.command;
        assert!(args.verbose);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["frag", "render", "--mode", "drafts"]).is_err());
    }
}
