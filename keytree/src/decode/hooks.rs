//! Decode hooks: value conversions keyed by the requested target type.
//!
//! When the decoder is asked for a target type and the source is a leaf
//! value, it passes the value through every hook in order: caller hooks
//! first, then the built-ins. A hook returning `Some(Ok(_))` replaces the
//! value seen by the hooks after it, `None` passes it on unchanged, and
//! `Some(Err(_))` stops the chain with that error.

use std::fmt;

use crate::duration::parse_duration;
use crate::value::Value;

/// The kind of value the target type asked the decoder for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// `bool`.
    Bool,
    /// Any integer type.
    Integer,
    /// `f32`/`f64`.
    Float,
    /// `String`, `&str`, `char` and identifiers.
    String,
    /// `std::time::Duration`.
    Duration,
    /// `Vec`, tuples, sets and other sequences.
    Sequence,
    /// An enum with the given type name.
    Enum(&'static str),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Duration => write!(f, "duration"),
            Self::Sequence => write!(f, "sequence"),
            Self::Enum(name) => write!(f, "enum {name}"),
        }
    }
}

/// A value conversion applied before the target type sees a leaf.
///
/// Any `Fn(Target, &Value) -> Option<Result<Value, String>>` closure is a hook.
///
/// # Examples
///
/// ```
/// use keytree::decode::{DecodeHook, Target};
/// use keytree::Value;
///
/// // Accept sizes such as "4k" for integer fields.
/// let kilo = |target: Target, value: &Value| match (target, value) {
///     (Target::Integer, Value::String(s)) => s
///         .strip_suffix('k')
///         .map(|n| n.parse::<i64>().map(|n| Value::Integer(n * 1024)).map_err(|e| e.to_string())),
///     _ => None,
/// };
/// assert_eq!(kilo.apply(Target::Integer, &Value::from("4k")), Some(Ok(Value::Integer(4096))));
/// assert_eq!(kilo.apply(Target::String, &Value::from("4k")), None);
/// ```
pub trait DecodeHook: Send + Sync {
    /// Converts `value` for `target`, or returns `None` to pass.
    fn apply(&self, target: Target, value: &Value) -> Option<Result<Value, String>>;
}

impl<F> DecodeHook for F
where
    F: Fn(Target, &Value) -> Option<Result<Value, String>> + Send + Sync,
{
    fn apply(&self, target: Target, value: &Value) -> Option<Result<Value, String>> {
        self(target, value)
    }
}

/// Parses duration literals (`"5s"`, `"1h30m"`) for duration targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToDurationHook;

impl DecodeHook for StringToDurationHook {
    fn apply(&self, target: Target, value: &Value) -> Option<Result<Value, String>> {
        match (target, value) {
            (Target::Duration, Value::String(s)) => Some(parse_duration(s).map(Value::Duration)),
            _ => None,
        }
    }
}

/// Splits strings on a separator for sequence targets.
///
/// An empty string yields an empty sequence. Elements are not trimmed.
#[derive(Debug, Clone)]
pub struct StringToSequenceHook {
    separator: String,
}

impl StringToSequenceHook {
    /// A hook splitting on `separator`.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for StringToSequenceHook {
    fn default() -> Self {
        Self::new(",")
    }
}

impl DecodeHook for StringToSequenceHook {
    fn apply(&self, target: Target, value: &Value) -> Option<Result<Value, String>> {
        match (target, value) {
            (Target::Sequence, Value::String(s)) if s.is_empty() => {
                Some(Ok(Value::Sequence(Vec::new())))
            }
            (Target::Sequence, Value::String(s)) if !self.separator.is_empty() => Some(Ok(
                Value::Sequence(s.split(self.separator.as_str()).map(Value::from).collect()),
            )),
            _ => None,
        }
    }
}
