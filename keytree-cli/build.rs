//! Build script for keytree-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// A repeatable `KEY=VALUE` global option.
fn assignment_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name("KEY=VALUE")
        .global(true)
        .action(ArgAction::Append)
}

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("keytree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect flat configuration stores as nested sub-trees")
        .long_about(
            "Command-line tool for viewing flat configuration stores as nested sub-trees",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .help("Merge a YAML config file into the config layer (repeatable)")
                .value_name("PATH")
                .global(true)
                .action(ArgAction::Append),
        )
        .arg(assignment_arg("default", "Bind a default value (repeatable)"))
        .arg(assignment_arg(
            "env",
            "Bind an environment-style override (repeatable)",
        ))
        .arg(assignment_arg(
            "set",
            "Bind an explicit override, the highest precedence (repeatable)",
        ))
        .arg(
            Arg::new("delimiter")
                .long("delimiter")
                .help("Key delimiter used to split flat keys")
                .value_name("DELIM")
                .default_value(".")
                .global(true)
                .env("KEYTREE_DELIMITER"),
        )
        .arg(
            Arg::new("type-by-default")
                .long("type-by-default")
                .help("Convert string overrides to the type of the key's default value")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommands(vec![
            Command::new("get")
                .about("Print the sub-tree under a prefix")
                .long_about("Reconstruct and print the nested mapping stored under a key prefix"),
            Command::new("keys")
                .about("List flat keys")
                .long_about("List every flat key, or only those nested under a prefix"),
            Command::new("sub")
                .about("Project a sub-tree into its own store")
                .long_about(
                    "Project the sub-tree under a prefix into a new store and print its settings",
                ),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() -> std::io::Result<()> {
    // Generate man pages at build time
    let out_dir = std::env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR is not set"))?;
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    // Generate main keytree.1 man page
    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;

    fs::write(man_dir.join("keytree.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
