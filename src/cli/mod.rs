//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for roitool using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// roitool - ROI import and export between OME-XML and an image store
#[derive(Parser, Debug)]
#[command(name = "roitool")]
#[command(version, about, long_about = None)]
#[command(author = "roitool Contributors")]
pub struct Cli {
    /// Path to configuration file; built-in defaults are used without one
    #[arg(short, long, env = "ROITOOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ROITOOL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(long)]
    pub debug: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level passed to the logger; an explicit `--log-level` wins over `--debug`
    pub fn effective_log_level(&self) -> &str {
        match (&self.log_level, self.debug) {
            (Some(level), _) => level,
            (None, true) => "debug",
            (None, false) => "info",
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import ROIs from an OME-XML file onto an image
    Import(commands::import::ImportArgs),

    /// Export the ROIs of an image to an OME-XML file
    Export(commands::export::ExportArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_import() {
        let cli = Cli::parse_from(["roitool", "import", "12", "rois.ome.xml", "-u", "analyst"]);
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.image_id.get(), 12);
        assert_eq!(args.path, PathBuf::from("rois.ome.xml"));
        assert_eq!(args.connection.username.as_deref(), Some("analyst"));
    }

    #[test]
    fn test_cli_parse_export_with_session_key() {
        let cli = Cli::parse_from([
            "roitool", "export", "7", "out.ome.xml", "--server", "store.example.org", "--port", "443",
            "--key", "abc",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.connection.server.as_deref(), Some("store.example.org"));
        assert_eq!(args.connection.port, Some(443));
        assert_eq!(args.connection.key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_rejects_non_positive_image_id() {
        assert!(Cli::try_parse_from(["roitool", "export", "0", "out.ome.xml"]).is_err());
        assert!(Cli::try_parse_from(["roitool", "export", "abc", "out.ome.xml"]).is_err());
    }

    #[test]
    fn test_cli_requires_path() {
        assert!(Cli::try_parse_from(["roitool", "import", "3"]).is_err());
    }

    #[test]
    fn test_log_level_selection() {
        let cli = Cli::parse_from(["roitool", "--debug", "export", "1", "o.xml"]);
        assert_eq!(cli.effective_log_level(), "debug");

        let cli = Cli::parse_from(["roitool", "--debug", "--log-level", "warn", "export", "1", "o.xml"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["roitool", "--config", "custom.toml", "export", "1", "o.xml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
