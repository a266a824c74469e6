//! Leaf values held by flat stores.
//!
//! A [`Value`] is whatever a flat store resolves for one exact key after
//! merging its sources. Nested mappings are never values: they only exist in
//! the reconstructed [`Tree`](crate::Tree).

use std::fmt;
use std::time::Duration;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::duration::{format_duration, parse_duration};
use crate::error::{Error, Result};

/// A resolved leaf value.
///
/// # Examples
///
/// ```
/// use keytree::Value;
///
/// let v = Value::from(50);
/// assert_eq!(v.as_i64(), Some(50));
/// assert_eq!(Value::from("info").as_str(), Some("info"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null, or a key the store listed but could not resolve.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
    /// A time span.
    Duration(Duration),
    /// Ordered list of values.
    Sequence(Vec<Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Duration(_) => "duration",
            Self::Sequence(_) => "sequence",
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The contained string, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The contained integer, if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The contained float; integers widen.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// The contained boolean, if this is a bool.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The contained duration, if this is a duration.
    #[must_use]
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// The contained sequence, if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Converts a string to the same variant as `template`.
    ///
    /// Used by stores that type environment-style string overrides after
    /// their default value. Returns `None` when `self` is not a string, the
    /// template is not a typed scalar, or the text does not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use keytree::Value;
    ///
    /// let coerced = Value::from("3").coerce_like(&Value::from(5));
    /// assert_eq!(coerced, Some(Value::Integer(3)));
    /// assert_eq!(Value::from("x").coerce_like(&Value::from(5)), None);
    /// ```
    #[must_use]
    pub fn coerce_like(&self, template: &Value) -> Option<Value> {
        let text = self.as_str()?.trim();
        match template {
            Self::Integer(_) => text.parse().ok().map(Self::Integer),
            Self::Float(_) => text.parse().ok().map(Self::Float),
            Self::Bool(_) => parse_bool(text).map(Self::Bool),
            Self::Duration(_) => parse_duration(text).ok().map(Self::Duration),
            _ => None,
        }
    }

    /// Converts a YAML scalar or list into a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for mappings (those belong in a
    /// [`Tree`](crate::Tree)) and for numbers outside the `i64`/`f64` range.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Self> {
        use serde_yaml::Value as Yaml;

        Ok(match yaml {
            Yaml::Null => Self::Null,
            Yaml::Bool(b) => Self::Bool(b),
            Yaml::Number(n) => {
                // Integers beyond i64 are rejected rather than rounded to a float.
                match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => Self::Integer(i),
                    (None, Some(f)) if n.is_f64() => Self::Float(f),
                    _ => {
                        return Err(Error::Validation {
                            field: n.to_string(),
                            message: "integer out of range for a 64-bit signed value".into(),
                        })
                    }
                }
            }
            Yaml::String(s) => Self::String(s),
            Yaml::Sequence(items) => Self::Sequence(
                items
                    .into_iter()
                    .map(Self::from_yaml)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Yaml::Tagged(tagged) => Self::from_yaml(tagged.value)?,
            Yaml::Mapping(_) => {
                return Err(Error::Validation {
                    field: "value".into(),
                    message: "mappings nested inside values are not supported".into(),
                })
            }
        })
    }

    /// Converts into a YAML value (durations render as text, e.g. `"1m30s"`).
    #[must_use]
    pub fn to_yaml(&self) -> serde_yaml::Value {
        use serde_yaml::Value as Yaml;

        match self {
            Self::Null => Yaml::Null,
            Self::Bool(b) => Yaml::Bool(*b),
            Self::Integer(n) => Yaml::Number((*n).into()),
            Self::Float(f) => Yaml::Number((*f).into()),
            Self::String(s) => Yaml::String(s.clone()),
            Self::Duration(d) => Yaml::String(format_duration(*d)),
            Self::Sequence(items) => Yaml::Sequence(items.iter().map(Self::to_yaml).collect()),
        }
    }
}

/// Parses the boolean spellings accepted by weak decoding and typed overrides.
///
/// Accepts true/t/1/yes/y/on and false/f/0/no/n/off (case-insensitive).
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Duration(d) => write!(f, "{}", format_duration(*d)),
            Self::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Duration(d) => serializer.serialize_str(&format_duration(*d)),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
