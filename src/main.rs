//! netcontext - normalise network device configuration for diffing
//!
//! This is the main entry point for the netcontext CLI.

mod cli;

use anyhow::Result;
use cli::commands::{CommandContext, Runnable};
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use netcontext::config::Config;
use netcontext::logging::init_logging;
use tracing::debug;

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration first so its log settings apply
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::new(!cli.no_color, cli.verbosity())
                .error(&format!("Failed to load config: {:#}", e));
            std::process::exit(2);
        }
    };

    if let Err(e) = init_logging(cli.verbosity(), config.logging.level, config.logging.format) {
        eprintln!("Warning: Failed to initialise logging: {}", e);
    }

    debug!(version = %netcontext::version_info(), "Starting");

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let command: &dyn Runnable = match &cli.command {
        Commands::Parse(args) => args,
        Commands::Summary(args) => args,
        Commands::Completions(args) => args,
    };
    let exit_code = command.run(&mut ctx)?;

    std::process::exit(exit_code);
}
