//! Projecting a sub-tree into a fresh store.

use crate::error::Result;
use crate::reconstruct::Reconstructor;
use crate::store::ProjectableStore;

impl Reconstructor {
    /// Returns a new store holding only the sub-tree under `prefix`.
    ///
    /// The new store is created with [`ProjectableStore::new_empty`] and the
    /// reconstructed mapping is loaded as its configuration layer, so keys
    /// are relative to `prefix`. It is a snapshot: later changes to `store`
    /// do not reach it. Returns `Ok(None)` when nothing lies under `prefix`.
    ///
    /// # Errors
    ///
    /// Propagates reconstruction errors and failures from
    /// [`ProjectableStore::merge_tree`].
    ///
    /// # Examples
    ///
    /// ```
    /// use keytree::{FlatStore, LayeredStore, Reconstructor, Value};
    ///
    /// let mut store = LayeredStore::new();
    /// store.set_default("log.max.size", 50);
    ///
    /// let sub = Reconstructor::new().project(&store, "log").unwrap().unwrap();
    /// assert_eq!(sub.get("max.size"), Some(Value::from(50)));
    /// ```
    pub fn project<S: ProjectableStore>(&self, store: &S, prefix: &str) -> Result<Option<S>> {
        let Some(tree) = self.reconstruct(store, prefix)? else {
            return Ok(None);
        };

        let mut sub = store.new_empty();
        sub.merge_tree(&tree)?;
        log::debug!("projected '{prefix}' into a new store with {} top-level keys", tree.len());
        Ok(Some(sub))
    }
}

/// [`Reconstructor::project`] with the default `.` delimiter.
///
/// # Errors
///
/// See [`Reconstructor::project`].
pub fn project<S: ProjectableStore>(store: &S, prefix: &str) -> Result<Option<S>> {
    Reconstructor::new().project(store, prefix)
}
