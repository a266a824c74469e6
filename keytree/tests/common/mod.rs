//! Common test utilities for integration tests.
//!
//! This module provides fixture builders for the layered stores the
//! integration tests reconstruct from.

use keytree::{LayeredStore, Source, Tree};

/// The logging section used throughout the scenarios, as a config file.
pub const LOG_YAML: &str = "
log:
  filename: logs/latest.log
  compress: true
  level: info
  timestampformat: 02-01-2006 15:04:05
  max:
    size: 50
    backups: 5
";

/// Parses an expected mapping written as YAML.
#[allow(dead_code)]
pub fn tree(yaml: &str) -> Tree {
    let document = serde_yaml::from_str(yaml).expect("expected tree is valid YAML");
    Tree::from_yaml(document).expect("expected tree is a mapping")
}

/// Builder for layered stores with sensible scenario presets.
///
/// # Examples
///
/// ```no_run
/// # use common::StoreFixture;
/// let store = StoreFixture::new().with_defaults().with_env().build();
/// ```
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct StoreFixture {
    defaults: bool,
    config: bool,
    env: bool,
    combined: bool,
    single_value: bool,
}

#[allow(dead_code)]
impl StoreFixture {
    /// Creates a fixture that builds an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default values for the logging section.
    pub fn with_defaults(mut self) -> Self {
        self.defaults = true;
        self
    }

    /// The logging section loaded from [`LOG_YAML`].
    pub fn with_config(mut self) -> Self {
        self.config = true;
        self
    }

    /// An environment override of `log.level`.
    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    /// Defaults, config and env together, plus a string env override of
    /// `log.max.backups` typed by its default value.
    pub fn combined(self) -> Self {
        Self {
            combined: true,
            ..self.with_defaults().with_config().with_env()
        }
    }

    /// `log` bound directly to a scalar.
    pub fn with_single_value(mut self) -> Self {
        self.single_value = true;
        self
    }

    /// Builds the store.
    pub fn build(self) -> LayeredStore {
        let mut store = LayeredStore::new();

        if self.defaults {
            store.set_default("log.filename", "logs/latest.log");
            store.set_default("log.compress", true);
            store.set_default("log.level", "info");
            store.set_default("log.max.backups", 5);
            store.set_default("log.max.age", 31);
        }

        if self.config {
            store
                .merge_yaml_str(LOG_YAML)
                .expect("scenario config is valid");
        }

        if self.env {
            store.set(Source::Env, "log.level", "debug");
        }

        if self.combined {
            store.set_type_by_default_value(true);
            store.set(Source::Env, "log.max.backups", "3");
        }

        if self.single_value {
            store.set_default("log", "fail");
        }

        store
    }
}
