//! Decoding reconstructed sub-trees into typed values.
//!
//! The decoder is a serde [`Deserializer`](serde::Deserializer), so any
//! `#[derive(Deserialize)]` type works as a target. Typing is weak by
//! default: flat stores often hold strings for numbers and flags, and the
//! decoder converts them following a fixed table keyed by the target type
//! (see [`de`] for the full table).
//!
//! Two built-in hooks run before that table:
//!
//! - [`StringToDurationHook`]: `"5s"` into [`std::time::Duration`]
//! - [`StringToSequenceHook`]: `"a,b,c"` into a sequence
//!
//! Caller hooks added with [`DecoderOptions::with_hook`] run first, and each
//! hook sees the output of the previous one.

pub mod de;
pub mod hooks;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{DecodeError, Result};
use crate::reconstruct::Reconstructor;
use crate::store::FlatStore;
use crate::tree::Tree;
use crate::value::Value;

pub use hooks::{DecodeHook, StringToDurationHook, StringToSequenceHook, Target};

use de::NodeDeserializer;

/// Decoder configuration: hooks, weak typing and the list separator.
///
/// # Examples
///
/// ```
/// use keytree::decode::DecoderOptions;
///
/// let strict = DecoderOptions::new().weakly_typed(false);
/// assert!(!strict.is_weakly_typed());
/// ```
#[derive(Clone)]
pub struct DecoderOptions {
    hooks: Vec<Arc<dyn DecodeHook>>,
    default_hooks: bool,
    weakly_typed: bool,
    sequence_hook: StringToSequenceHook,
}

impl DecoderOptions {
    /// Weak typing on, built-in hooks on, `,` as list separator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: Vec::new(),
            default_hooks: true,
            weakly_typed: true,
            sequence_hook: StringToSequenceHook::default(),
        }
    }

    /// Adds a hook that runs before the built-in hooks.
    #[must_use]
    pub fn with_hook(mut self, hook: impl DecodeHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Disables the built-in duration and list hooks.
    #[must_use]
    pub fn without_default_hooks(mut self) -> Self {
        self.default_hooks = false;
        self
    }

    /// Enables or disables weak type conversion.
    #[must_use]
    pub fn weakly_typed(mut self, enabled: bool) -> Self {
        self.weakly_typed = enabled;
        self
    }

    /// The separator used by the built-in list hook.
    #[must_use]
    pub fn sequence_separator(mut self, separator: impl Into<String>) -> Self {
        self.sequence_hook = StringToSequenceHook::new(separator);
        self
    }

    /// Whether weak type conversion is enabled.
    #[must_use]
    pub fn is_weakly_typed(&self) -> bool {
        self.weakly_typed
    }

    /// Runs the hook chain for one leaf. `None` means no hook fired.
    pub(crate) fn run_hooks(
        &self,
        target: Target,
        value: &Value,
    ) -> Option<std::result::Result<Value, String>> {
        let builtin: [&dyn DecodeHook; 2] = [&StringToDurationHook, &self.sequence_hook];
        let builtin: &[&dyn DecodeHook] = if self.default_hooks { &builtin } else { &[] };

        let mut converted: Option<Value> = None;
        let caller = self.hooks.iter().map(|hook| &**hook as &dyn DecodeHook);
        for hook in caller.chain(builtin.iter().copied()) {
            match hook.apply(target, converted.as_ref().unwrap_or(value)) {
                Some(Ok(next)) => converted = Some(next),
                Some(Err(message)) => return Some(Err(message)),
                None => {}
            }
        }
        converted.map(Ok)
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecoderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderOptions")
            .field("hooks", &self.hooks.len())
            .field("default_hooks", &self.default_hooks)
            .field("weakly_typed", &self.weakly_typed)
            .field("sequence_hook", &self.sequence_hook)
            .finish()
    }
}

/// Decodes a tree into `T`.
///
/// # Errors
///
/// Returns a [`DecodeError`] locating the first field that failed.
///
/// # Examples
///
/// ```
/// use keytree::decode::{decode_tree, DecoderOptions};
/// use keytree::{Tree, Value};
/// use std::collections::BTreeMap;
///
/// let tree: Tree = [("size", Value::from("50"))].into_iter().collect();
/// let map: BTreeMap<String, u32> = decode_tree(&tree, &DecoderOptions::new()).unwrap();
/// assert_eq!(map["size"], 50);
/// ```
pub fn decode_tree<T: DeserializeOwned>(
    tree: &Tree,
    options: &DecoderOptions,
) -> std::result::Result<T, DecodeError> {
    T::deserialize(NodeDeserializer::root(tree, options))
}

impl Reconstructor {
    /// Reconstructs the sub-tree under `prefix` and decodes it into `target`.
    ///
    /// When nothing lies under `prefix` the target is left untouched and no
    /// error is returned. Otherwise `target` is replaced by the decoded
    /// value; fields missing from the tree take their serde defaults.
    ///
    /// # Errors
    ///
    /// Propagates reconstruction errors and returns [`Error::Decode`] when
    /// the tree does not fit `T`. On error `target` is unchanged.
    ///
    /// [`Error::Decode`]: crate::Error::Decode
    ///
    /// # Examples
    ///
    /// ```
    /// use keytree::decode::DecoderOptions;
    /// use keytree::{LayeredStore, Reconstructor};
    /// use serde::Deserialize;
    /// use std::time::Duration;
    ///
    /// #[derive(Debug, Default, Deserialize)]
    /// struct Http {
    ///     timeout: Duration,
    ///     hosts: Vec<String>,
    /// }
    ///
    /// let mut store = LayeredStore::new();
    /// store.set_default("http.timeout", "5s");
    /// store.set_default("http.hosts", "a,b,c");
    ///
    /// let mut http = Http::default();
    /// Reconstructor::new()
    ///     .decode_into(&store, "http", &mut http, &DecoderOptions::new())
    ///     .unwrap();
    /// assert_eq!(http.timeout, Duration::from_secs(5));
    /// assert_eq!(http.hosts, ["a", "b", "c"]);
    /// ```
    pub fn decode_into<S, T>(
        &self,
        store: &S,
        prefix: &str,
        target: &mut T,
        options: &DecoderOptions,
    ) -> Result<()>
    where
        S: FlatStore + ?Sized,
        T: DeserializeOwned,
    {
        let Some(tree) = self.reconstruct(store, prefix)? else {
            log::debug!("nothing under '{prefix}', leaving decode target unchanged");
            return Ok(());
        };

        *target = decode_tree(&tree, options)?;
        Ok(())
    }

    /// Decodes the sub-tree under `prefix` into a new `T`.
    ///
    /// An absent sub-tree decodes as an empty mapping, so types whose fields
    /// all have serde defaults come back as their defaults.
    ///
    /// # Errors
    ///
    /// As [`Reconstructor::decode_into`], plus a decode error when the
    /// sub-tree is absent and `T` has required fields.
    pub fn decode<S, T>(&self, store: &S, prefix: &str, options: &DecoderOptions) -> Result<T>
    where
        S: FlatStore + ?Sized,
        T: DeserializeOwned,
    {
        let tree = self.reconstruct(store, prefix)?.unwrap_or_default();
        Ok(decode_tree(&tree, options)?)
    }
}

/// [`Reconstructor::decode_into`] with the `.` delimiter and default options.
///
/// # Errors
///
/// See [`Reconstructor::decode_into`].
pub fn decode_into<S, T>(store: &S, prefix: &str, target: &mut T) -> Result<()>
where
    S: FlatStore + ?Sized,
    T: DeserializeOwned,
{
    Reconstructor::new().decode_into(store, prefix, target, &DecoderOptions::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{LayeredStore, Source};
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap};
    use std::time::Duration;

    type HookResult = Option<std::result::Result<Value, String>>;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct MaxConfig {
        size: u32,
        backups: u8,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct LogConfig {
        filename: String,
        max: MaxConfig,
        #[serde(default)]
        rotate: Duration,
        #[serde(default)]
        compress: bool,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Level {
        Debug,
        Info,
        Warn,
    }

    fn log_store() -> LayeredStore {
        let mut store = LayeredStore::new();
        store.set_default("log.filename", "logs/latest.log");
        store.set_default("log.max.size", 50);
        store.set_default("log.max.backups", 5);
        store
    }

    fn decode<T: DeserializeOwned>(store: &LayeredStore, prefix: &str) -> Result<T> {
        Reconstructor::new().decode(store, prefix, &DecoderOptions::new())
    }

    #[test]
    fn test_decode_nested_struct() {
        let config: LogConfig = decode(&log_store(), "log").unwrap();
        assert_eq!(
            config,
            LogConfig {
                filename: "logs/latest.log".into(),
                max: MaxConfig { size: 50, backups: 5 },
                ..LogConfig::default()
            }
        );
    }

    #[test]
    fn test_decode_merged_sources() {
        let mut store = log_store();
        store.set(Source::Env, "log.max.backups", "3");
        store.set(Source::Override, "log.compress", "yes");

        let config: LogConfig = decode(&store, "log").unwrap();
        assert_eq!(config.max.backups, 3);
        assert!(config.compress);
    }

    #[test]
    fn test_decode_duration_string() {
        let mut store = log_store();
        store.set_default("log.rotate", "1h30m");
        let config: LogConfig = decode(&store, "log").unwrap();
        assert_eq!(config.rotate, Duration::from_secs(5400));
    }

    #[test]
    fn test_decode_duration_value_and_nanos() {
        let mut store = LayeredStore::new();
        store.set_default("t.a", Duration::from_millis(250));
        store.set_default("t.b", 1_500_000_000);

        let timeouts: BTreeMap<String, Duration> = decode(&store, "t").unwrap();
        assert_eq!(timeouts["a"], Duration::from_millis(250));
        assert_eq!(timeouts["b"], Duration::from_millis(1500));
    }

    #[test]
    fn test_decode_duration_rejects_garbage() {
        let mut store = log_store();
        store.set_default("log.rotate", "soon");
        let err = decode::<LogConfig>(&store, "log").unwrap_err();
        match err {
            Error::Decode(e) => assert_eq!(e.path(), Some("rotate")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_comma_list() {
        #[derive(Debug, Deserialize)]
        struct Cluster {
            hosts: Vec<String>,
            ports: Vec<u16>,
        }

        let mut store = LayeredStore::new();
        store.set_default("cluster.hosts", "a,b,c");
        store.set_default("cluster.ports", "80,443");

        let cluster: Cluster = decode(&store, "cluster").unwrap();
        assert_eq!(cluster.hosts, ["a", "b", "c"]);
        assert_eq!(cluster.ports, [80, 443]);
    }

    #[test]
    fn test_decode_custom_separator() {
        let mut store = LayeredStore::new();
        store.set_default("app.tags", "x;y");

        let options = DecoderOptions::new().sequence_separator(";");
        let tags: HashMap<String, Vec<String>> =
            Reconstructor::new().decode(&store, "app", &options).unwrap();
        assert_eq!(tags["tags"], ["x", "y"]);
    }

    #[test]
    fn test_decode_real_sequence_and_single_value() {
        let mut store = LayeredStore::new();
        store.set_default("app.list", vec!["a", "b"]);
        store.set_default("app.one", 7);

        let lists: BTreeMap<String, Vec<String>> = decode(&store, "app").unwrap();
        assert_eq!(lists["list"], ["a", "b"]);
        assert_eq!(lists["one"], ["7"]);
    }

    #[test]
    fn test_strict_mode_rejects_strings_for_numbers() {
        let mut store = log_store();
        store.set(Source::Env, "log.max.size", "60");

        let strict = DecoderOptions::new().weakly_typed(false);
        let err = Reconstructor::new()
            .decode::<_, LogConfig>(&store, "log", &strict)
            .unwrap_err();
        match err {
            Error::Decode(e) => {
                assert_eq!(e.path(), Some("max.size"));
                assert!(e.message().contains("expected an integer"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let weak: LogConfig = decode(&store, "log").unwrap();
        assert_eq!(weak.max.size, 60);
    }

    #[test]
    fn test_weak_conversions() {
        #[derive(Debug, Deserialize)]
        struct Mixed {
            flag: bool,
            ratio: f64,
            label: String,
            count: i32,
            hex: u32,
        }

        let mut store = LayeredStore::new();
        store.set_default("m.flag", 1);
        store.set_default("m.ratio", "0.5");
        store.set_default("m.label", 42);
        store.set_default("m.count", 2.9);
        store.set_default("m.hex", "0x10");

        let mixed: Mixed = decode(&store, "m").unwrap();
        assert!(mixed.flag);
        assert!((mixed.ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(mixed.label, "42");
        assert_eq!(mixed.count, 2);
        assert_eq!(mixed.hex, 16);
    }

    #[test]
    fn test_out_of_range_integer() {
        let mut store = LayeredStore::new();
        store.set_default("m.backups", 300);
        let err = decode::<BTreeMap<String, u8>>(&store, "m").unwrap_err();
        assert!(matches!(err, Error::Decode(ref e) if e.path() == Some("backups")));
    }

    #[test]
    fn test_float_beyond_integer_range_is_an_error() {
        let mut store = LayeredStore::new();
        store.set_default("m.big", 1e20);
        let err = decode::<BTreeMap<String, u64>>(&store, "m").unwrap_err();
        assert!(matches!(err, Error::Decode(ref e) if e.path() == Some("big")));

        store.set_default("m.big", -1e19);
        assert!(decode::<BTreeMap<String, i64>>(&store, "m").is_err());

        store.set_default("m.big", 1e19);
        let map: BTreeMap<String, u64> = decode(&store, "m").unwrap();
        assert_eq!(map["big"], 10_000_000_000_000_000_000);
        assert!(decode::<BTreeMap<String, i64>>(&store, "m").is_err());
    }

    #[test]
    fn test_yaml_integer_beyond_i64_is_rejected_on_load() {
        let mut store = LayeredStore::new();
        let err = store
            .merge_yaml_str("app:\n  big: 18446744073709551615\n")
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(!store.is_set("app.big"));
    }

    #[test]
    fn test_caller_hook_takes_precedence() {
        let mut store = log_store();
        store.set_default("log.rotate", "daily");

        let daily = |target: Target, value: &Value| -> HookResult {
            match (target, value) {
                (Target::Duration, Value::String(s)) if s == "daily" => {
                    Some(Ok(Value::Duration(Duration::from_secs(86_400))))
                }
                _ => None,
            }
        };
        let options = DecoderOptions::new().with_hook(daily);
        let config: LogConfig = Reconstructor::new().decode(&store, "log", &options).unwrap();
        assert_eq!(config.rotate, Duration::from_secs(86_400));

        // Built-in hooks still handle what the caller hook passes on.
        store.set_default("log.rotate", "2s");
        let config: LogConfig = Reconstructor::new().decode(&store, "log", &options).unwrap();
        assert_eq!(config.rotate, Duration::from_secs(2));
    }

    #[test]
    fn test_hooks_see_the_previous_hook_output() {
        let mut store = LayeredStore::new();
        store.set_default("app.timeout", "five seconds");

        let spelled = |target: Target, value: &Value| -> HookResult {
            match (target, value) {
                (Target::Duration, Value::String(s)) if s == "five seconds" => {
                    Some(Ok(Value::from("5s")))
                }
                _ => None,
            }
        };
        let options = DecoderOptions::new().with_hook(spelled);
        let app: BTreeMap<String, Duration> =
            Reconstructor::new().decode(&store, "app", &options).unwrap();
        assert_eq!(app["timeout"], Duration::from_secs(5));

        let failing = |_: Target, _: &Value| -> HookResult { Some(Err("rejected".into())) };
        let options = DecoderOptions::new().with_hook(failing).with_hook(spelled);
        let err = Reconstructor::new()
            .decode::<_, BTreeMap<String, Duration>>(&store, "app", &options)
            .unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn test_caller_hook_overrides_builtin_for_same_input() {
        let mut store = LayeredStore::new();
        store.set_default("app.hosts", "a,b");

        let whole = |target: Target, value: &Value| -> HookResult {
            match (target, value) {
                (Target::Sequence, Value::String(s)) => Some(Ok(Value::from(vec![s.clone()]))),
                _ => None,
            }
        };
        let options = DecoderOptions::new().with_hook(whole);
        let hosts: BTreeMap<String, Vec<String>> =
            Reconstructor::new().decode(&store, "app", &options).unwrap();
        assert_eq!(hosts["hosts"], ["a,b"]);
    }

    #[test]
    fn test_hook_error_is_reported_with_path() {
        let mut store = LayeredStore::new();
        store.set_default("app.port", "http");

        let reject = |target: Target, value: &Value| -> HookResult {
            match (target, value) {
                (Target::Integer, Value::String(s)) if s == "http" => {
                    Some(Err("named ports are not supported".to_string()))
                }
                _ => None,
            }
        };
        let options = DecoderOptions::new().with_hook(reject);
        let err = Reconstructor::new()
            .decode::<_, BTreeMap<String, u16>>(&store, "app", &options)
            .unwrap_err();
        assert!(err.to_string().contains("'port': named ports are not supported"));
    }

    #[test]
    fn test_without_default_hooks() {
        let mut store = log_store();
        store.set_default("log.rotate", "5s");

        let options = DecoderOptions::new().without_default_hooks();
        assert!(Reconstructor::new()
            .decode::<_, LogConfig>(&store, "log", &options)
            .is_err());
    }

    #[test]
    fn test_decode_into_absent_leaves_target() {
        let mut config = LogConfig {
            filename: "keep.log".into(),
            ..LogConfig::default()
        };
        decode_into(&log_store(), "db", &mut config).unwrap();
        assert_eq!(config.filename, "keep.log");
    }

    #[test]
    fn test_decode_into_replaces_target() {
        let mut config = LogConfig::default();
        decode_into(&log_store(), "log", &mut config).unwrap();
        assert_eq!(config.max.size, 50);
    }

    #[test]
    fn test_decode_into_error_keeps_target() {
        let mut store = log_store();
        store.set_default("log.max.size", "huge");

        let mut config = LogConfig {
            filename: "keep.log".into(),
            ..LogConfig::default()
        };
        assert!(decode_into(&store, "log", &mut config).is_err());
        assert_eq!(config.filename, "keep.log");
    }

    #[test]
    fn test_decode_absent_uses_defaults() {
        #[derive(Debug, Default, PartialEq, Deserialize)]
        #[serde(default)]
        struct Db {
            host: String,
            port: u16,
        }

        let db: Db = decode(&log_store(), "db").unwrap();
        assert_eq!(db, Db::default());
        assert!(decode::<LogConfig>(&log_store(), "db").is_err());
    }

    #[test]
    fn test_missing_field_reports_struct_path() {
        let mut store = LayeredStore::new();
        store.set_default("log.filename", "x");
        store.set_default("log.max.size", 1);

        let err = decode::<LogConfig>(&store, "log").unwrap_err();
        match err {
            Error::Decode(e) => {
                assert_eq!(e.path(), Some("max"));
                assert!(e.message().contains("backups"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_names_match_ignoring_case() {
        #[derive(Debug, Deserialize)]
        struct Pool {
            #[serde(rename = "maxIdle")]
            max_idle: u32,
        }

        let mut store = LayeredStore::new();
        store.set_default("pool.maxIdle", 4);
        assert_eq!(store.all_keys(), ["pool.maxidle"]);

        let pool: Pool = decode(&store, "pool").unwrap();
        assert_eq!(pool.max_idle, 4);
    }

    #[test]
    fn test_decode_enums() {
        #[derive(Debug, Deserialize)]
        struct Logging {
            level: Level,
        }

        let mut store = LayeredStore::new();
        store.set_default("log.level", "warn");
        let logging: Logging = decode(&store, "log").unwrap();
        assert_eq!(logging.level, Level::Warn);

        store.set_default("log.level", "loud");
        assert!(decode::<Logging>(&store, "log").is_err());
    }

    #[test]
    fn test_decode_enum_from_single_key_branch() {
        #[derive(Debug, PartialEq, Deserialize)]
        #[serde(rename_all = "lowercase")]
        enum Output {
            File { path: String },
            Stderr,
        }

        #[derive(Debug, Deserialize)]
        struct Sink {
            output: Output,
        }

        let mut store = LayeredStore::new();
        store.set_default("sink.output.file.path", "/tmp/x.log");
        let sink: Sink = decode(&store, "sink").unwrap();
        assert_eq!(
            sink.output,
            Output::File {
                path: "/tmp/x.log".into()
            }
        );

        let mut store = LayeredStore::new();
        store.set_default("sink.output", "stderr");
        let sink: Sink = decode(&store, "sink").unwrap();
        assert_eq!(sink.output, Output::Stderr);
        let mut store = LayeredStore::new();
        store.set_default("sink.output.stderr", Value::Null);
        let sink: Sink = decode(&store, "sink").unwrap();
        assert_eq!(sink.output, Output::Stderr);

        let mut store = LayeredStore::new();
        store.set_default("sink.output.stderr", 5);
        let err = decode::<Sink>(&store, "sink").unwrap_err();
        assert!(matches!(err, Error::Decode(ref e) if e.path() == Some("output.stderr")));
    }

    #[test]
    fn test_decode_options_and_null() {
        #[derive(Debug, Deserialize)]
        struct Opt {
            present: Option<u32>,
            null: Option<u32>,
            missing: Option<u32>,
        }

        let mut store = LayeredStore::new();
        store.set_default("o.present", "9");
        store.set_default("o.null", Value::Null);

        let opt: Opt = decode(&store, "o").unwrap();
        assert_eq!(opt.present, Some(9));
        assert_eq!(opt.null, None);
        assert_eq!(opt.missing, None);
    }

    #[test]
    fn test_decode_into_dynamic_value() {
        let mut store = log_store();
        store.set_default("log.rotate", Duration::from_secs(90));

        let json: serde_json::Value = decode(&store, "log").unwrap();
        assert_eq!(json["max"]["size"], 50);
        assert_eq!(json["filename"], "logs/latest.log");
        assert_eq!(json["rotate"], "1m30s");
    }

    #[test]
    fn test_collision_is_not_a_decode_error() {
        let mut store = log_store();
        store.set_default("log.max", 10);
        let err = decode::<LogConfig>(&store, "log").unwrap_err();
        assert!(err.is_collision());
    }

    #[test]
    fn test_decode_with_custom_delimiter() {
        let mut store = LayeredStore::new();
        store.set_default("log/max/size", 50);
        store.set_default("log/max/backups", 1);
        store.set_default("log/filename", "a.log");

        let slash = Reconstructor::with_delimiter("/".parse().unwrap());
        let config: LogConfig = slash.decode(&store, "log", &DecoderOptions::new()).unwrap();
        assert_eq!(config.max, MaxConfig { size: 50, backups: 1 });
    }

    #[test]
    fn test_options_debug() {
        let options = DecoderOptions::new()
            .with_hook(|_: Target, _: &Value| -> HookResult { None });
        let debug = format!("{options:?}");
        assert!(debug.contains("hooks: 1"));
        assert!(debug.contains("weakly_typed: true"));
    }
}
