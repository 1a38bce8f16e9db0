//! Completions command
//!
//! Writes a shell completion script for netcontext to stdout.

use super::{CommandContext, Runnable};
use crate::cli::Cli;
use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

/// Arguments for the completions command
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Execute the completions command
    pub fn execute(&self, _ctx: &mut CommandContext) -> Result<i32> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(completions_script(self.shell).as_bytes())?;
        Ok(0)
    }
}

impl Runnable for CompletionsArgs {
    fn run(&self, ctx: &mut CommandContext) -> Result<i32> {
        self.execute(ctx)
    }
}

/// Completion script for `shell`, as text.
pub fn completions_script(shell: Shell) -> String {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, "netcontext", &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
