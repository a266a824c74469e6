//! Reference flat store with fixed source precedence.
//!
//! Values are kept per [`Source`]. A lookup walks the sources from highest
//! to lowest precedence and returns the first binding, so every key carries
//! the merge semantics of the whole store:
//!
//! 1. [`Source::Override`]: explicit sets (highest)
//! 2. [`Source::Env`]: environment-style overrides
//! 3. [`Source::Config`]: merged configuration maps
//! 4. [`Source::Default`]: defaults (lowest)
//!
//! Keys are case-insensitive: they are lowercased on every write and lookup.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::delimiter::Delimiter;
use crate::error::{Error, Result};
use crate::store::{FlatStore, ProjectableStore};
use crate::tree::Tree;
use crate::value::Value;

/// A configuration source, ordered from lowest to highest precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    /// Built-in defaults.
    Default,
    /// Configuration maps (files, documents, projected sub-trees).
    Config,
    /// Environment-style overrides.
    Env,
    /// Explicit programmatic sets.
    Override,
}

impl Source {
    /// All sources, lowest precedence first.
    pub const ALL: [Self; 4] = [Self::Default, Self::Config, Self::Env, Self::Override];
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Config => write!(f, "config"),
            Self::Env => write!(f, "env"),
            Self::Override => write!(f, "override"),
        }
    }
}

/// In-memory layered store.
///
/// # Examples
///
/// ```
/// use keytree::{FlatStore, LayeredStore, Source, Value};
///
/// let mut store = LayeredStore::new();
/// store.set_default("log.max.backups", 5);
/// store.set(Source::Override, "log.max.backups", 3);
///
/// assert_eq!(store.get("log.max.backups"), Some(Value::from(3)));
/// assert_eq!(store.all_keys(), ["log.max.backups"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayeredStore {
    delimiter: Delimiter,
    layers: BTreeMap<Source, BTreeMap<String, Value>>,
    type_by_default_value: bool,
}

impl LayeredStore {
    /// Creates an empty store using the `.` delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose keys are joined with `delimiter`.
    ///
    /// The delimiter is used when loading nested mappings and when rendering
    /// [`LayeredStore::all_settings`].
    #[must_use]
    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }

    /// The store's key delimiter.
    #[must_use]
    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// When enabled, string values bound by higher sources are converted to
    /// the type of the key's default value if they parse as such.
    pub fn set_type_by_default_value(&mut self, enabled: bool) {
        self.type_by_default_value = enabled;
    }

    /// Binds `key` in `source`, replacing any previous binding there.
    pub fn set(&mut self, source: Source, key: &str, value: impl Into<Value>) {
        self.layers
            .entry(source)
            .or_default()
            .insert(normalize_key(key), value.into());
    }

    /// Binds a default value.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        self.set(Source::Default, key, value);
    }

    /// Binds an explicit override.
    pub fn set_override(&mut self, key: &str, value: impl Into<Value>) {
        self.set(Source::Override, key, value);
    }

    /// Removes the binding of `key` in `source`.
    pub fn unset(&mut self, source: Source, key: &str) -> Option<Value> {
        self.layers.get_mut(&source)?.remove(&normalize_key(key))
    }

    /// Flattens `tree` with the store delimiter into the config layer.
    ///
    /// Keys already present in the config layer are overwritten.
    pub fn merge_config_tree(&mut self, tree: &Tree) {
        let layer = self.layers.entry(Source::Config).or_default();
        for (key, value) in tree.flatten(&self.delimiter) {
            layer.insert(normalize_key(&key), value);
        }
    }

    /// Parses a YAML document and merges it into the config layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for invalid YAML and
    /// [`Error::Validation`] when the document is not a mapping.
    pub fn merge_yaml_str(&mut self, yaml: &str) -> Result<()> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let tree = Tree::from_yaml(document)?;
        log::debug!("merging {} top-level config entries", tree.len());
        self.merge_config_tree(&tree);
        Ok(())
    }

    /// The winning value for `key` together with the source it came from.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<(Source, Value)> {
        let key = normalize_key(key);
        let (source, value) = Source::ALL
            .iter()
            .rev()
            .find_map(|source| Some((*source, self.layers.get(source)?.get(&key)?)))?;

        if self.type_by_default_value && source != Source::Default {
            if let Some(typed) = self
                .layers
                .get(&Source::Default)
                .and_then(|defaults| defaults.get(&key))
                .and_then(|default| value.coerce_like(default))
            {
                return Some((source, typed));
            }
        }

        Some((source, value.clone()))
    }

    /// True when any source binds `key`.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.layers.values().any(|layer| layer.contains_key(&key))
    }

    /// Every key as a nested mapping, split on the store delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyCollision`] when one key is bound both as a value
    /// and as the parent of another key (for example `log` and `log.level`).
    pub fn all_settings(&self) -> Result<Tree> {
        let mut tree = Tree::new();
        for key in self.all_keys() {
            let value = self.get(&key).unwrap_or(Value::Null);
            let segments: Vec<&str> = self.delimiter.split(&key).collect();
            tree.insert_path(&segments, value)
                .map_err(|collision| Error::KeyCollision {
                    segment: self.delimiter.join(&segments[..=collision.depth]),
                    key: key.clone(),
                })?;
        }
        Ok(tree)
    }
}

fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

impl FlatStore for LayeredStore {
    fn all_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&String> = self.layers.values().flat_map(BTreeMap::keys).collect();
        keys.into_iter().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.resolve(key).map(|(_, value)| value)
    }
}

impl ProjectableStore for LayeredStore {
    fn new_empty(&self) -> Self {
        Self {
            delimiter: self.delimiter.clone(),
            layers: BTreeMap::new(),
            type_by_default_value: self.type_by_default_value,
        }
    }

    fn merge_tree(&mut self, tree: &Tree) -> Result<()> {
        self.merge_config_tree(tree);
        Ok(())
    }
}
