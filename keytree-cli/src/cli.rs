//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{CompletionsCommand, GetCommand, KeysCommand, SubCommand};
use crate::utils::GlobalOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for viewing flat configuration stores as nested sub-trees.
#[derive(Parser)]
#[command(name = "keytree")]
#[command(
    version,
    about = "Inspect flat configuration stores as nested sub-trees",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Merge a YAML config file into the config layer (repeatable)
    #[arg(long = "file", short = 'f', value_name = "PATH", global = true)]
    pub files: Vec<PathBuf>,

    /// Bind a default value (repeatable)
    #[arg(long = "default", value_name = "KEY=VALUE", global = true)]
    pub defaults: Vec<String>,

    /// Bind an environment-style override (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", global = true)]
    pub env: Vec<String>,

    /// Bind an explicit override, the highest precedence (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub overrides: Vec<String>,

    /// Key delimiter used to split flat keys
    #[arg(
        long,
        value_name = "DELIM",
        default_value = ".",
        global = true,
        env = "KEYTREE_DELIMITER"
    )]
    pub delimiter: String,

    /// Convert string overrides to the type of the key's default value
    #[arg(long, global = true)]
    pub type_by_default: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Collect the global options shared by every command.
    pub fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            verbose: self.verbose,
            quiet: self.quiet,
            files: self.files.clone(),
            defaults: self.defaults.clone(),
            env: self.env.clone(),
            overrides: self.overrides.clone(),
            delimiter: self.delimiter.clone(),
            type_by_default: self.type_by_default,
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the sub-tree under a prefix
    Get(GetCommand),

    /// List flat keys
    Keys(KeysCommand),

    /// Project a sub-tree into its own store
    Sub(SubCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
