//! Parse command
//!
//! Prints the normalised tree of one configuration file.

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use netcontext::config::OutputFormat;
use std::path::PathBuf;

/// Arguments for the parse command
#[derive(Parser, Debug, Clone)]
pub struct ParseArgs {
    /// Path to the device configuration file
    #[arg(required = true)]
    pub file: PathBuf,

    /// Only print these top-level sections
    #[arg(long = "section", short = 's', action = clap::ArgAction::Append)]
    pub sections: Vec<String>,

    /// Output format (defaults to the configured one)
    #[arg(long, short = 'o', value_enum)]
    pub output: Option<OutputFormat>,
}

impl ParseArgs {
    /// Execute the parse command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let tree = match ctx.parse_file(&self.file) {
            Ok((tree, _)) => tree,
            Err(err) => return Ok(ctx.report(&self.file, &err)),
        };

        let tree = if self.sections.is_empty() {
            tree
        } else {
            for missing in self
                .sections
                .iter()
                .filter(|s| tree.get(s.as_str()).is_none())
            {
                ctx.output
                    .info(&format!("Section '{}' not present in {}", missing, self.file.display()));
            }
            tree.select(&self.sections)
        };

        let format = self.output.unwrap_or(ctx.config.output.format);
        ctx.output.tree(&tree, format, ctx.config.output.pretty)?;

        Ok(0)
    }
}

impl Runnable for ParseArgs {
    fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_parsing() {
        let args = ParseArgs::try_parse_from(["parse", "router.cfg"]).unwrap();
        assert_eq!(args.file, PathBuf::from("router.cfg"));
        assert!(args.sections.is_empty());
        assert_eq!(args.output, None);
    }

    #[test]
    fn test_parse_args_with_output() {
        let args = ParseArgs::try_parse_from(["parse", "router.cfg", "-o", "json"]).unwrap();
        assert_eq!(args.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_parse_args_rejects_unknown_output() {
        assert!(ParseArgs::try_parse_from(["parse", "router.cfg", "-o", "xml"]).is_err());
    }
}
