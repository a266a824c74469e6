//! Nested mappings rebuilt from flat keys.

use std::collections::btree_map::{self, BTreeMap};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::delimiter::Delimiter;
use crate::error::{Error, Result};
use crate::value::Value;

/// One entry of a [`Tree`]: a leaf value or a nested mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A resolved store value.
    Leaf(Value),
    /// A nested mapping.
    Branch(Tree),
}

impl Node {
    /// The leaf value, if this is a leaf.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&Value> {
        match self {
            Self::Leaf(v) => Some(v),
            Self::Branch(_) => None,
        }
    }

    /// The nested mapping, if this is a branch.
    #[must_use]
    pub const fn as_branch(&self) -> Option<&Tree> {
        match self {
            Self::Branch(t) => Some(t),
            Self::Leaf(_) => None,
        }
    }

    /// Converts a YAML value: mappings become branches, everything else leaves.
    ///
    /// # Errors
    ///
    /// Returns an error for non-string mapping keys or mappings nested in
    /// sequences.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Self> {
        match yaml {
            serde_yaml::Value::Mapping(_) => Tree::from_yaml(yaml).map(Self::Branch),
            other => Value::from_yaml(other).map(Self::Leaf),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Self::Leaf(value)
    }
}

impl From<Tree> for Node {
    fn from(tree: Tree) -> Self {
        Self::Branch(tree)
    }
}

/// A nested mapping keyed by path segment.
///
/// Entries are kept in key order so that rendering and comparisons are
/// deterministic.
///
/// # Examples
///
/// ```
/// use keytree::{Node, Tree, Value};
///
/// let mut max = Tree::new();
/// max.insert("size", Value::from(50));
/// let mut log = Tree::new();
/// log.insert("max", max);
///
/// assert_eq!(log.lookup_path(&["max", "size"]).and_then(Node::as_leaf), Some(&Value::from(50)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    entries: BTreeMap<String, Node>,
}

/// Where a path insertion collided with an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Collision {
    /// Index of the colliding segment within the inserted path.
    pub depth: usize,
}

impl Tree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the tree has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct child by segment.
    #[must_use]
    pub fn get(&self, segment: &str) -> Option<&Node> {
        self.entries.get(segment)
    }

    /// Inserts a direct child, returning the node it replaced.
    pub fn insert(&mut self, segment: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.entries.insert(segment.into(), node.into())
    }

    /// Removes a direct child.
    pub fn remove(&mut self, segment: &str) -> Option<Node> {
        self.entries.remove(segment)
    }

    /// Iterates over direct children in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Node> {
        self.entries.iter()
    }

    /// Direct child segment names in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Follows `path` segment by segment.
    #[must_use]
    pub fn lookup_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.get(segment.as_ref())?.as_branch()?;
        }
        current.get(last.as_ref())
    }

    /// Looks up a delimiter-joined key.
    #[must_use]
    pub fn lookup(&self, key: &str, delimiter: &Delimiter) -> Option<&Node> {
        let segments: Vec<&str> = delimiter.split(key).collect();
        self.lookup_path(&segments)
    }

    /// Places `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Existing intermediate mappings are reused. Fails when a parent
    /// segment already holds a leaf, or when the final segment already holds
    /// a mapping. A leaf at the final segment is replaced.
    pub(crate) fn insert_path<S: AsRef<str>>(
        &mut self,
        path: &[S],
        value: Value,
    ) -> std::result::Result<(), Collision> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(());
        };

        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            let node = current
                .entries
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| Node::Branch(Tree::new()));
            current = match node {
                Node::Branch(child) => child,
                Node::Leaf(_) => return Err(Collision { depth }),
            };
        }

        if matches!(current.entries.get(last.as_ref()), Some(Node::Branch(_))) {
            return Err(Collision {
                depth: parents.len(),
            });
        }
        current
            .entries
            .insert(last.as_ref().to_string(), Node::Leaf(value));
        Ok(())
    }

    /// Every leaf as a `(flat key, value)` pair, keys joined with `delimiter`.
    ///
    /// Empty sub-mappings contribute nothing.
    #[must_use]
    pub fn flatten(&self, delimiter: &Delimiter) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.flatten_into(delimiter, &mut path, &mut out);
        out
    }

    fn flatten_into<'a>(
        &'a self,
        delimiter: &Delimiter,
        path: &mut Vec<&'a str>,
        out: &mut Vec<(String, Value)>,
    ) {
        for (segment, node) in &self.entries {
            path.push(segment);
            match node {
                Node::Leaf(value) => out.push((delimiter.join(path.as_slice()), value.clone())),
                Node::Branch(child) => child.flatten_into(delimiter, path, out),
            }
            path.pop();
        }
    }

    /// Converts a YAML mapping into a tree.
    ///
    /// A null document yields an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the document is not a mapping or
    /// contains non-scalar keys.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Self> {
        let mapping = match yaml {
            serde_yaml::Value::Null => return Ok(Self::new()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Tagged(tagged) => return Self::from_yaml(tagged.value),
            other => {
                return Err(Error::Validation {
                    field: "document".into(),
                    message: format!("expected a mapping, found {}", yaml_kind(&other)),
                })
            }
        };

        let mut tree = Self::new();
        for (key, value) in mapping {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(Error::Validation {
                        field: "key".into(),
                        message: format!("unsupported {} mapping key", yaml_kind(&other)),
                    })
                }
            };
            tree.insert(key, Node::from_yaml(value)?);
        }
        Ok(tree)
    }

    /// Converts into a YAML mapping.
    #[must_use]
    pub fn to_yaml(&self) -> serde_yaml::Value {
        let mut mapping = serde_yaml::Mapping::new();
        for (key, node) in &self.entries {
            let value = match node {
                Node::Leaf(v) => v.to_yaml(),
                Node::Branch(t) => t.to_yaml(),
            };
            mapping.insert(serde_yaml::Value::String(key.clone()), value);
        }
        serde_yaml::Value::Mapping(mapping)
    }
}

fn yaml_kind(yaml: &serde_yaml::Value) -> &'static str {
    match yaml {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = (&'a String, &'a Node);
    type IntoIter = btree_map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, N: Into<Node>> FromIterator<(K, N)> for Tree {
    fn from_iter<I: IntoIterator<Item = (K, N)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, n)| (k.into(), n.into()))
                .collect(),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(v) => v.serialize(serializer),
            Self::Branch(t) => t.serialize(serializer),
        }
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        let yaml = "filename: logs/latest.log\ncompress: true\nmax:\n  size: 50\n  backups: 5\n";
        Tree::from_yaml(serde_yaml::from_str(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_from_yaml_builds_branches() {
        let tree = sample();
        assert_eq!(tree.len(), 3);
        assert_eq!(
            tree.lookup("max.backups", &Delimiter::DOT).and_then(Node::as_leaf),
            Some(&Value::Integer(5))
        );
        assert!(tree.get("max").and_then(Node::as_branch).is_some());
    }

    #[test]
    fn test_from_yaml_rejects_scalar_document() {
        let err = Tree::from_yaml(serde_yaml::Value::String("x".into())).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_from_yaml_null_document_is_empty() {
        assert!(Tree::from_yaml(serde_yaml::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_insert_path_reuses_intermediate_maps() {
        let mut tree = Tree::new();
        tree.insert_path(&["max", "size"], Value::from(50)).unwrap();
        tree.insert_path(&["max", "backups"], Value::from(5)).unwrap();
        let max = tree.get("max").and_then(Node::as_branch).unwrap();
        assert_eq!(max.len(), 2);
    }

    #[test]
    fn test_insert_path_collisions() {
        let mut tree = Tree::new();
        tree.insert_path(&["max"], Value::from(1)).unwrap();
        assert_eq!(
            tree.insert_path(&["max", "size"], Value::from(50)),
            Err(Collision { depth: 0 })
        );

        let mut tree = Tree::new();
        tree.insert_path(&["a", "b", "c"], Value::from(1)).unwrap();
        assert_eq!(
            tree.insert_path(&["a", "b"], Value::from(2)),
            Err(Collision { depth: 1 })
        );
    }

    #[test]
    fn test_flatten_with_delimiter() {
        let tree = sample();
        let dash = Delimiter::new("-").unwrap();
        let flat = tree.flatten(&dash);
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["compress", "filename", "max-backups", "max-size"]);
    }

    #[test]
    fn test_to_yaml_roundtrip() {
        let tree = sample();
        assert_eq!(Tree::from_yaml(tree.to_yaml()).unwrap(), tree);
    }

    #[test]
    fn test_serialize_json() {
        let tree: Tree = [("b", Value::from(2)), ("a", Value::from(1))].into_iter().collect();
        assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"a":1,"b":2}"#);
    }
}
