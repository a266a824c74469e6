//! Keys command implementation.
//!
//! This module implements the `keys` command, which lists the flat keys of
//! the assembled store.

use crate::error::CliError;
use crate::utils::{build_reconstructor, build_store, GlobalOptions};
use clap::Args;
use keytree::FlatStore;
use std::io::Write;

/// List flat keys, optionally only those under a prefix.
#[derive(Args)]
pub struct KeysCommand {
    /// Only list keys under this prefix
    #[arg(value_name = "PREFIX")]
    pub prefix: Option<String>,
}

impl KeysCommand {
    /// Execute the keys command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let store = build_store(global)?;

        let keys = match self.prefix.as_deref() {
            Some(prefix) => build_reconstructor(global)?.keys_under(&store, prefix)?,
            None => store.all_keys(),
        };

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        for key in &keys {
            writeln!(handle, "{key}")?;
        }

        Ok(())
    }
}
