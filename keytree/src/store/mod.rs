//! The flat key-value store contract.
//!
//! Reconstruction only needs two read operations from a store: the full list
//! of flat keys and the merged value for one exact key. Projection
//! additionally needs to create an empty store of the same kind and bulk-load
//! a [`Tree`] into it.
//!
//! [`LayeredStore`] is a reference implementation with a fixed source
//! precedence. Plain `BTreeMap`/`HashMap`s of flat keys also work as stores;
//! projected maps are keyed with the `.` delimiter.

pub mod layered;

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::delimiter::Delimiter;
use crate::error::Result;
use crate::tree::Tree;
use crate::value::Value;

pub use layered::{LayeredStore, Source};

/// Read access to a store of flat, delimiter-joined keys.
///
/// Implementations are expected to have merged all of their sources already:
/// [`FlatStore::get`] returns the winning value for a key.
#[cfg_attr(test, mockall::automock)]
pub trait FlatStore {
    /// Every known flat key. Order is not significant.
    fn all_keys(&self) -> Vec<String>;

    /// The merged value bound to exactly `key`.
    fn get(&self, key: &str) -> Option<Value>;
}

/// A store that can produce a fresh, empty instance of itself and bulk-load
/// a nested mapping.
pub trait ProjectableStore: FlatStore + Sized {
    /// A new empty store configured like `self` (same delimiter and options)
    /// but holding no values.
    #[must_use]
    fn new_empty(&self) -> Self;

    /// Loads `tree` as a configuration layer.
    ///
    /// # Errors
    ///
    /// Implementation specific; the reference store never fails.
    fn merge_tree(&mut self, tree: &Tree) -> Result<()>;
}

impl<S: FlatStore + ?Sized> FlatStore for &S {
    fn all_keys(&self) -> Vec<String> {
        (**self).all_keys()
    }

    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }
}

impl FlatStore for BTreeMap<String, Value> {
    fn all_keys(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<H: BuildHasher> FlatStore for HashMap<String, Value, H> {
    fn all_keys(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        HashMap::get(self, key).cloned()
    }
}

impl ProjectableStore for BTreeMap<String, Value> {
    fn new_empty(&self) -> Self {
        Self::new()
    }

    fn merge_tree(&mut self, tree: &Tree) -> Result<()> {
        self.extend(tree.flatten(&Delimiter::DOT));
        Ok(())
    }
}

impl<H: BuildHasher + Default> ProjectableStore for HashMap<String, Value, H> {
    fn new_empty(&self) -> Self {
        Self::default()
    }

    fn merge_tree(&mut self, tree: &Tree) -> Result<()> {
        self.extend(tree.flatten(&Delimiter::DOT));
        Ok(())
    }
}
