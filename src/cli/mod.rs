//! CLI module for netcontext
//!
//! This module provides the command-line interface for netcontext,
//! including argument parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// netcontext - normalise network device configuration for diffing
///
/// Parses Cisco IOS style configuration into a structured tree.
#[derive(Parser, Debug, Clone)]
#[command(name = "netcontext")]
#[command(author = "netcontext Contributors")]
#[command(version)]
#[command(about = "Parse network device configuration into a normalised tree", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "NETCONTEXT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Parse a configuration file and print the tree
    Parse(commands::parse::ParseArgs),

    /// Print the sections of a configuration file and their sizes
    Summary(commands::summary::SummaryArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcontext::config::OutputFormat;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["netcontext", "parse", "router.cfg"]).unwrap();
        assert!(matches!(cli.command, Commands::Parse(_)));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["netcontext", "-vvvv", "summary", "router.cfg"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_parse_sections_and_output() {
        let cli = Cli::try_parse_from([
            "netcontext",
            "parse",
            "router.cfg",
            "--section",
            "interfaces",
            "-s",
            "acl4-std",
            "--output",
            "yaml",
        ])
        .unwrap();

        let Commands::Parse(args) = cli.command else {
            panic!("expected parse subcommand");
        };
        assert_eq!(args.sections, vec!["interfaces", "acl4-std"]);
        assert_eq!(args.output, Some(OutputFormat::Yaml));
    }

    #[test]
    fn test_file_is_required() {
        assert!(Cli::try_parse_from(["netcontext", "parse"]).is_err());
    }
}
