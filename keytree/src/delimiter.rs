//! Key segment delimiter.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The string joining path segments inside a flat key.
///
/// Always non-empty. Defaults to `"."`.
///
/// # Examples
///
/// ```
/// use keytree::Delimiter;
///
/// let dash = Delimiter::new("-").unwrap();
/// assert_eq!(dash.split("max-size").collect::<Vec<_>>(), ["max", "size"]);
/// assert!(Delimiter::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(Cow<'static, str>);

impl Delimiter {
    /// The default `"."` delimiter.
    pub const DOT: Self = Self(Cow::Borrowed("."));

    /// Creates a delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDelimiter`] if `delimiter` is empty.
    pub fn new(delimiter: impl Into<String>) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(Error::InvalidDelimiter {
                delimiter,
                reason: "must not be empty".into(),
            });
        }
        Ok(Self(Cow::Owned(delimiter)))
    }

    /// The delimiter text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits a key into its segments.
    pub fn split<'a>(&'a self, key: &'a str) -> std::str::Split<'a, &'a str> {
        key.split(self.as_str())
    }

    /// Joins segments into a key.
    #[must_use]
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push_str(self.as_str());
            }
            out.push_str(segment.as_ref());
        }
        out
    }

    /// `prefix` followed by the delimiter: the text every key under
    /// `prefix` starts with.
    #[must_use]
    pub fn child_prefix(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.as_str())
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::DOT
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Delimiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_dot() {
        assert_eq!(Delimiter::default().as_str(), ".");
        assert_eq!(Delimiter::default(), Delimiter::DOT);
    }

    #[test]
    fn test_empty_rejected() {
        let err = Delimiter::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidDelimiter { .. }));
        assert!("".parse::<Delimiter>().is_err());
    }

    #[test]
    fn test_multi_char_delimiter() {
        let d: Delimiter = "::".parse().unwrap();
        assert_eq!(d.split("a::b::c").collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(d.join(&["a", "b"]), "a::b");
        assert_eq!(d.child_prefix("log"), "log::");
    }

    #[test]
    fn test_join_single_segment() {
        assert_eq!(Delimiter::DOT.join(&["only"]), "only");
        assert_eq!(Delimiter::DOT.join::<&str>(&[]), "");
    }
}
