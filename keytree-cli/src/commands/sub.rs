//! Sub command implementation.
//!
//! This module implements the `sub` command, which projects the sub-tree
//! under a prefix into a standalone store and prints either all of its
//! settings or one key looked up in it.

use crate::error::CliError;
use crate::utils::{build_reconstructor, build_store, print_rendered, GlobalOptions, OutputFormat};
use clap::Args;
use keytree::FlatStore;

/// Project a sub-tree into its own store.
#[derive(Args)]
pub struct SubCommand {
    /// Key prefix to project
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

    /// Key to look up in the projected store, relative to PREFIX
    #[arg(value_name = "KEY")]
    pub key: Option<String>,

    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "yaml",
        env = "KEYTREE_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,
}

impl SubCommand {
    /// Execute the sub command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let store = build_store(global)?;
        let reconstructor = build_reconstructor(global)?;

        let sub = reconstructor
            .project(&store, &self.prefix)?
            .ok_or_else(|| CliError::NotFound(format!("No sub-tree under '{}'", self.prefix)))?;

        let Some(key) = self.key else {
            return print_rendered(&sub.all_settings()?, self.format);
        };

        if let Some(value) = sub.get(&key) {
            return print_rendered(&value, self.format);
        }

        // The key may name a nested section of the projection.
        match reconstructor.reconstruct(&sub, &key)? {
            Some(tree) => print_rendered(&tree, self.format),
            None => Err(CliError::NotFound(format!(
                "'{key}' is not set under '{}'",
                self.prefix
            ))),
        }
    }
}
