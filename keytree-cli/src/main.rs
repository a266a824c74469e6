//! Main entry point for the keytree CLI.
//!
//! This is the command-line interface for inspecting layered, flat-keyed
//! configuration as nested sub-trees. It provides these commands:
//! - `get`: Print the sub-tree under a prefix
//! - `keys`: List flat keys
//! - `sub`: Project a sub-tree into its own store
//! - `completions`: Generate shell completion scripts

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _logger = keytree::init_logger(cli.verbose, cli.quiet);

    let global = cli.global_options();

    // Execute the command
    let result = match cli.command {
        cli::Command::Get(cmd) => cmd.execute(&global),
        cli::Command::Keys(cmd) => cmd.execute(&global),
        cli::Command::Sub(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
