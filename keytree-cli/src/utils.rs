//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands:
//! assembling the layered store from global options and rendering output.

use crate::error::CliError;
use clap::ValueEnum;
use keytree::{Delimiter, LayeredStore, Reconstructor, Source, Value};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)] // verbose/quiet are consumed by the logger in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// YAML files merged, in order, into the config layer.
    pub files: Vec<PathBuf>,

    /// `KEY=VALUE` bindings for the default layer.
    pub defaults: Vec<String>,

    /// `KEY=VALUE` bindings for the env layer.
    pub env: Vec<String>,

    /// `KEY=VALUE` bindings for the override layer.
    pub overrides: Vec<String>,

    /// Key delimiter.
    pub delimiter: String,

    /// Type string overrides after their default values.
    pub type_by_default: bool,
}

/// Output format for rendered trees and values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML (human-readable)
    #[default]
    Yaml,
    /// JSON format
    Json,
}

/// Parse the global delimiter option.
pub fn parse_delimiter(global: &GlobalOptions) -> Result<Delimiter, CliError> {
    Delimiter::new(global.delimiter.as_str()).map_err(CliError::from)
}

/// Build a reconstructor using the global delimiter.
pub fn build_reconstructor(global: &GlobalOptions) -> Result<Reconstructor, CliError> {
    Ok(Reconstructor::with_delimiter(parse_delimiter(global)?))
}

/// Assemble the layered store described by the global options.
///
/// Sources are applied lowest precedence first:
/// 1. `--default` bindings
/// 2. `--file` documents (later files overwrite earlier ones)
/// 3. `--env` bindings
/// 4. `--set` bindings (highest priority)
pub fn build_store(global: &GlobalOptions) -> Result<LayeredStore, CliError> {
    let mut store = LayeredStore::with_delimiter(parse_delimiter(global)?);
    store.set_type_by_default_value(global.type_by_default);

    for assignment in &global.defaults {
        let (key, value) = parse_assignment(assignment)?;
        store.set(Source::Default, &key, value);
    }

    for path in &global.files {
        let text = fs::read_to_string(path)?;
        store
            .merge_yaml_str(&text)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("loaded config file {}", path.display());
    }

    for assignment in &global.env {
        let (key, value) = parse_assignment(assignment)?;
        store.set(Source::Env, &key, value);
    }

    for assignment in &global.overrides {
        let (key, value) = parse_assignment(assignment)?;
        store.set(Source::Override, &key, value);
    }

    Ok(store)
}

/// Parse a `KEY=VALUE` binding.
///
/// The value is read as a YAML scalar or flow sequence, so `5` is an
/// integer, `true` a bool and `[a, b]` a list. Anything YAML cannot read
/// as such stays a plain string, as does an empty value.
pub fn parse_assignment(assignment: &str) -> Result<(String, Value), CliError> {
    let (key, raw) = assignment.split_once('=').ok_or_else(|| {
        CliError::InvalidArguments(format!("expected KEY=VALUE, got '{assignment}'"))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidArguments(format!(
            "missing key in '{assignment}'"
        )));
    }

    if raw.is_empty() {
        return Ok((key.to_string(), Value::from("")));
    }

    let value = match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(serde_yaml::Value::Mapping(_)) => {
            return Err(CliError::InvalidArguments(format!(
                "value for '{key}' must be a scalar or a list, not a mapping"
            )))
        }
        Ok(yaml) => Value::from_yaml(yaml).map_err(CliError::from)?,
        Err(_) => Value::from(raw),
    };

    Ok((key.to_string(), value))
}

/// Render a serializable value in the given format.
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| CliError::Output(e.to_string()))
        }
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|json| json + "\n")
            .map_err(|e| CliError::Output(e.to_string())),
    }
}

/// Render and write to stdout.
pub fn print_rendered<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
) -> Result<(), CliError> {
    let rendered = render(value, format)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(rendered.as_bytes())?;
    Ok(())
}
