//! Terminal output for the netcontext CLI.

use anyhow::Result;
use colored::Colorize;
use netcontext::config::OutputFormat;
use netcontext::tree::ConfigTree;
use std::io::{self, Write};

/// Output formatter for trees, tables and diagnostics
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            verbosity,
        }
    }

    /// Serialise a tree in the requested format
    pub fn render_tree(tree: &ConfigTree, format: OutputFormat, pretty: bool) -> Result<String> {
        let mut text = match format {
            OutputFormat::Json if pretty => serde_json::to_string_pretty(tree)?,
            OutputFormat::Json => serde_json::to_string(tree)?,
            OutputFormat::Yaml => serde_yaml::to_string(tree)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Print a tree to stdout
    pub fn tree(&self, tree: &ConfigTree, format: OutputFormat, pretty: bool) -> Result<()> {
        let text = Self::render_tree(tree, format, pretty)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity == 0 {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".green(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        // Print header
        let header_line = format_row(headers.iter().copied(), &widths);
        if self.use_color {
            println!("{}", header_line.bright_white().bold());
        } else {
            println!("{}", header_line);
        }

        // Print separator
        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        if self.use_color {
            println!("{}", sep.join("-+-").bright_black());
        } else {
            println!("{}", sep.join("-+-"));
        }

        // Print rows
        for row in rows {
            println!("{}", format_row(row.iter().map(String::as_str), &widths));
        }
    }
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}
