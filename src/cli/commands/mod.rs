//! Subcommands module for the netcontext CLI
//!
//! This module contains all the subcommand implementations.

pub mod completions;
pub mod parse;
pub mod summary;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use netcontext::config::Config;
use netcontext::error::Error;
use netcontext::ios::IosParser;
use netcontext::parser::ParseStats;
use netcontext::tree::ConfigTree;
use std::path::Path;
use tracing::{debug, info};

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.verbosity());

        Self { config, output }
    }

    /// Read and parse one device configuration file.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub fn parse_file(&self, path: &Path) -> netcontext::error::Result<(ConfigTree, ParseStats)> {
        debug!(path = %path.display(), dialect = %self.config.parser.dialect, "Reading configuration");

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);

        let parser = IosParser::new()?;
        let (tree, stats) = parser.parse_lines(text.lines())?;

        info!(
            path = %path.display(),
            lines = stats.lines,
            matched = stats.matched,
            ignored = stats.ignored,
            "Parsed configuration"
        );

        Ok((tree, stats))
    }

    /// Print a parse failure and return the exit code it maps to.
    pub fn report(&self, path: &Path, err: &Error) -> i32 {
        self.output.error(&format!("{}: {}", path.display(), err));
        err.exit_code()
    }
}

/// Trait for runnable commands
pub trait Runnable {
    /// Execute the command
    fn run(&self, ctx: &mut CommandContext) -> Result<i32>;
}
