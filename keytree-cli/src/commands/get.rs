//! Get command implementation.
//!
//! This module implements the `get` command, which prints the nested
//! sub-tree rebuilt from every flat key under a prefix.

use crate::error::CliError;
use crate::utils::{build_reconstructor, build_store, print_rendered, GlobalOptions, OutputFormat};
use clap::Args;
use keytree::FlatStore;

/// Print the sub-tree under a prefix.
#[derive(Args)]
pub struct GetCommand {
    /// Key prefix, e.g. `log` or `log.max`
    #[arg(value_name = "PREFIX")]
    pub prefix: String,

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

impl GetCommand {
    /// Execute the get command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let store = build_store(global)?;
        let reconstructor = build_reconstructor(global)?;

        let Some(tree) = reconstructor.reconstruct(&store, &self.prefix)? else {
            let hint = if store.get(&self.prefix).is_some() {
                " (it is bound to a single value)"
            } else {
                ""
            };
            return Err(CliError::NotFound(format!(
                "No sub-tree under '{}'{hint}",
                self.prefix
            )));
        };

        print_rendered(&tree, self.format)
    }
}
