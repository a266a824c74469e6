//! Rebuilding nested sub-trees from flat keys.
//!
//! A flat store lists keys such as `log.max.size` but cannot hand back the
//! mapping rooted at `log`. [`Reconstructor::reconstruct`] walks every known
//! key, keeps those strictly under `prefix + delimiter`, and places each
//! key's merged value at the path given by the remaining segments.
//!
//! The reconstructor applies no precedence logic: every leaf is whatever
//! [`FlatStore::get`] returns for that exact key.

use crate::delimiter::Delimiter;
use crate::error::{Error, Result};
use crate::store::FlatStore;
use crate::tree::Tree;
use crate::value::Value;

/// Rebuilds nested sub-trees using a fixed key delimiter.
///
/// # Examples
///
/// ```
/// use keytree::{LayeredStore, Reconstructor, Value};
///
/// let mut store = LayeredStore::new();
/// store.set_default("log.filename", "logs/latest.log");
/// store.set_default("log.max.size", 50);
///
/// let tree = Reconstructor::new().reconstruct(&store, "log").unwrap().unwrap();
/// assert_eq!(tree.keys().collect::<Vec<_>>(), ["filename", "max"]);
///
/// assert!(Reconstructor::new().reconstruct(&store, "db").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstructor {
    delimiter: Delimiter,
}

impl Reconstructor {
    /// A reconstructor splitting keys on `.`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reconstructor splitting keys on `delimiter`.
    #[must_use]
    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// The delimiter used for prefix matching and segment splitting.
    #[must_use]
    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// Flat keys strictly under `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPrefix`] if `prefix` is empty.
    pub fn keys_under<S: FlatStore + ?Sized>(&self, store: &S, prefix: &str) -> Result<Vec<String>> {
        let match_prefix = self.match_prefix(prefix)?;
        let mut keys: Vec<String> = store
            .all_keys()
            .into_iter()
            .filter(|key| key.starts_with(&match_prefix))
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Rebuilds the nested mapping under `prefix`.
    ///
    /// Returns `Ok(None)` when no key lies under `prefix`. A value bound
    /// directly at `prefix` is not part of its sub-tree and is ignored. Keys
    /// listed by the store but not resolvable become [`Value::Null`].
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyPrefix`] if `prefix` is empty.
    /// - [`Error::KeyCollision`] if some segment is a value under one key and
    ///   a parent under another. This is reported whatever order the store
    ///   lists its keys in.
    pub fn reconstruct<S: FlatStore + ?Sized>(
        &self,
        store: &S,
        prefix: &str,
    ) -> Result<Option<Tree>> {
        let match_prefix = self.match_prefix(prefix)?;
        let mut tree = Tree::new();
        let mut matched = 0usize;

        for key in store.all_keys() {
            let Some(tail) = key.strip_prefix(&match_prefix) else {
                continue;
            };

            let value = store.get(&key).unwrap_or_else(|| {
                log::debug!("key '{key}' is listed but has no value, using null");
                Value::Null
            });

            let segments: Vec<&str> = self.delimiter.split(tail).collect();
            tree.insert_path(&segments, value)
                .map_err(|collision| Error::KeyCollision {
                    segment: self.delimiter.join(&segments[..=collision.depth]),
                    key: key.clone(),
                })?;
            matched += 1;
        }

        if matched == 0 {
            log::debug!("no keys under '{match_prefix}'");
            return Ok(None);
        }

        log::trace!("rebuilt '{prefix}' from {matched} keys");
        Ok(Some(tree))
    }

    fn match_prefix(&self, prefix: &str) -> Result<String> {
        if prefix.is_empty() {
            return Err(Error::EmptyPrefix);
        }
        Ok(self.delimiter.child_prefix(prefix))
    }
}

/// [`Reconstructor::reconstruct`] with the default `.` delimiter.
///
/// # Errors
///
/// See [`Reconstructor::reconstruct`].
pub fn reconstruct<S: FlatStore + ?Sized>(store: &S, prefix: &str) -> Result<Option<Tree>> {
    Reconstructor::new().reconstruct(store, prefix)
}
