//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `get`: Print the sub-tree under a prefix
//! - `keys`: List flat keys
//! - `sub`: Project a sub-tree into its own store
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod get;
pub mod keys;
pub mod sub;

pub use completions::CompletionsCommand;
pub use get::GetCommand;
pub use keys::KeysCommand;
pub use sub::SubCommand;
