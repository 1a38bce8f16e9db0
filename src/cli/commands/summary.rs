//! Summary command
//!
//! Lists the sections found in a configuration file and how many objects
//! or entries each one holds.

use super::{CommandContext, Runnable};
use anyhow::Result;
use clap::Parser;
use netcontext::tree::ConfigTree;
use std::path::PathBuf;

/// Arguments for the summary command
#[derive(Parser, Debug, Clone)]
pub struct SummaryArgs {
    /// Path to the device configuration file
    #[arg(required = true)]
    pub file: PathBuf,
}

impl SummaryArgs {
    /// Execute the summary command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let (tree, stats) = match ctx.parse_file(&self.file) {
            Ok(parsed) => parsed,
            Err(err) => return Ok(ctx.report(&self.file, &err)),
        };

        let rows = summary_rows(&tree);
        if rows.is_empty() {
            ctx.output
                .warning(&format!("No recognised configuration in {}", self.file.display()));
        } else {
            ctx.output.table(&["SECTION", "KIND", "ENTRIES"], &rows);
        }

        println!();
        println!(
            "{} lines: {} matched, {} ignored, {} blank",
            stats.lines, stats.matched, stats.ignored, stats.blank
        );

        Ok(0)
    }
}

impl Runnable for SummaryArgs {
    fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx)
    }
}

/// One row per top-level section, in the order sections were created.
fn summary_rows(tree: &ConfigTree) -> Vec<Vec<String>> {
    tree.root()
        .iter()
        .map(|(name, value)| vec![name.clone(), value.kind().to_string(), value.len().to_string()])
        .collect()
}
