#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # keytree
//!
//! A library for rebuilding nested configuration sub-trees from flat stores.
//!
//! Layered configuration stores usually merge their sources into flat,
//! delimiter-joined keys (`log.max.size`). That makes single-key lookups easy
//! but loses the nested view: there is no way to ask for "everything under
//! `log`" as a mapping. This crate restores it.
//!
//! ## Core Types
//!
//! - [`FlatStore`] and [`ProjectableStore`]: the store contract
//! - [`LayeredStore`] and [`Source`]: a reference store with source precedence
//! - [`Reconstructor`]: rebuilds, projects and decodes sub-trees
//! - [`Tree`], [`Node`] and [`Value`]: the reconstructed mapping
//! - [`DecoderOptions`] and [`DecodeHook`]: weakly typed struct decoding
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use keytree::{FlatStore, LayeredStore, Node, Reconstructor, Source, Value};
//!
//! let mut store = LayeredStore::new();
//! store.set_default("log.filename", "logs/latest.log");
//! store.set_default("log.max.size", 50);
//! store.set(Source::Env, "log.max.size", 100);
//!
//! let reconstructor = Reconstructor::new();
//!
//! // The nested mapping, with every leaf resolved by the store.
//! let log = reconstructor.reconstruct(&store, "log").unwrap().unwrap();
//! let size = log.lookup_path(&["max", "size"]).and_then(Node::as_leaf);
//! assert_eq!(size, Some(&Value::from(100)));
//!
//! // A standalone store holding only that sub-tree.
//! let sub = reconstructor.project(&store, "log").unwrap().unwrap();
//! assert_eq!(sub.get("filename"), Some(Value::from("logs/latest.log")));
//! ```

pub mod decode;
pub mod delimiter;
pub mod duration;
pub mod error;
pub mod logging;
pub mod project;
pub mod reconstruct;
pub mod store;
pub mod tree;
pub mod value;

// Re-export key types at crate root for convenience
pub use decode::{decode_into, decode_tree, DecodeHook, DecoderOptions, Target};
pub use delimiter::Delimiter;
pub use duration::{format_duration, parse_duration};
pub use error::{DecodeError, Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use project::project;
pub use reconstruct::{reconstruct, Reconstructor};
pub use store::{FlatStore, LayeredStore, ProjectableStore, Source};
pub use tree::{Node, Tree};
pub use value::Value;
