//! Error types for the keytree library.
//!
//! This module provides the error hierarchy for reconstruction, projection
//! and decoding, using `thiserror` for ergonomic error handling.

use std::fmt;

use thiserror::Error;

/// Result type alias for operations that may fail with a keytree error.
///
/// # Examples
///
/// ```
/// use keytree::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(3)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the keytree library.
#[derive(Debug, Error)]
pub enum Error {
    /// A key delimiter was rejected.
    #[error("invalid key delimiter '{delimiter}': {reason}")]
    InvalidDelimiter {
        /// The rejected delimiter.
        delimiter: String,
        /// The reason the delimiter is invalid.
        reason: String,
    },

    /// A sub-tree was requested for an empty prefix.
    #[error("prefix must not be empty")]
    EmptyPrefix,

    /// A segment is bound both as a leaf and as an intermediate node.
    #[error("key collision at '{segment}': '{key}' needs it as both a value and a sub-tree")]
    KeyCollision {
        /// The flat key whose insertion hit the collision.
        key: String,
        /// The full path (relative to the prefix) of the colliding segment.
        segment: String,
    },

    /// Decoding a sub-tree into a typed value failed.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A YAML document could not be converted.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },
}

impl Error {
    /// Check if error is a leaf/sub-tree collision.
    #[must_use]
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::KeyCollision { .. })
    }
}

/// Error produced while decoding a sub-tree into a typed value.
///
/// The message is whatever the decoder (or serde's generated code) reported;
/// `path` locates the offending field relative to the decoded prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    path: Option<String>,
    message: String,
}

impl DecodeError {
    /// Creates an error at the given path.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: (!path.is_empty()).then_some(path),
            message: message.into(),
        }
    }

    /// The dotted field path where decoding failed, if known.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The underlying decoder message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attaches `path` unless a deeper path was already recorded.
    #[must_use]
    pub(crate) fn at(mut self, path: &str) -> Self {
        if self.path.is_none() && !path.is_empty() {
            self.path = Some(path.to_string());
        }
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "'{path}': {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DecodeError {}

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            path: None,
            message: msg.to_string(),
        }
    }
}
