//! A weakly typed serde deserializer over reconstructed trees.
//!
//! Branches deserialize as maps (or structs), leaves as whatever the target
//! asks for. Before a leaf reaches the target it runs through the configured
//! decode hooks; afterwards the weak conversion table below applies when
//! weak typing is enabled.
//!
//! | target   | accepted leaves (weak typing in brackets)                    |
//! |----------|--------------------------------------------------------------|
//! | bool     | bool \[integer, float, string, null\]                        |
//! | integer  | integer, float (truncated) \[bool, string, duration, null\]  |
//! | float    | float, integer \[bool, string, null\]                        |
//! | string   | string \[bool, integer, float, duration, null\]              |
//! | duration | duration, mapping of `secs`/`nanos` \[integer nanos, null\]  |
//! | sequence | sequence, null \[any other leaf as one element\]             |
//! | struct   | mapping, null \[empty sequence\]                             |

use std::borrow::Cow;
use std::collections::btree_map;
use std::time::Duration;

use serde::de::value::{SeqDeserializer, StrDeserializer};
use serde::de::{
    self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};

use crate::decode::hooks::Target;
use crate::decode::DecoderOptions;
use crate::duration::format_duration;
use crate::error::DecodeError;
use crate::tree::{Node, Tree};
use crate::value::{parse_bool, Value};

type Result<T> = std::result::Result<T, DecodeError>;

/// Field list serde generates for `std::time::Duration`.
const DURATION_FIELDS: &[&str] = &["secs", "nanos"];

static EMPTY_TREE: Tree = Tree::new();

enum Input<'a> {
    Tree(&'a Tree),
    Value(Cow<'a, Value>),
}

enum Integer {
    Signed(i64),
    Unsigned(u64),
}

/// Deserializes one node of a tree.
pub(crate) struct NodeDeserializer<'a> {
    input: Input<'a>,
    path: String,
    options: &'a DecoderOptions,
}

impl<'a> NodeDeserializer<'a> {
    pub(crate) fn root(tree: &'a Tree, options: &'a DecoderOptions) -> Self {
        Self {
            input: Input::Tree(tree),
            path: String::new(),
            options,
        }
    }

    fn node(node: &'a Node, path: String, options: &'a DecoderOptions) -> Self {
        let input = match node {
            Node::Branch(tree) => Input::Tree(tree),
            Node::Leaf(value) => Input::Value(Cow::Borrowed(value)),
        };
        Self {
            input,
            path,
            options,
        }
    }

    fn weak(&self) -> bool {
        self.options.is_weakly_typed()
    }

    fn leaf(&self) -> Option<&Value> {
        match &self.input {
            Input::Value(value) => Some(&**value),
            Input::Tree(_) => None,
        }
    }

    fn error(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::new(self.path.clone(), message)
    }

    fn mismatch(&self, expected: &str) -> DecodeError {
        mismatch(&self.path, &self.input, expected)
    }

    /// Replaces the leaf with the output of the hook chain, if any hook fired.
    fn apply_hooks(&mut self, target: Target) -> Result<()> {
        if let Input::Value(value) = &self.input {
            if let Some(result) = self.options.run_hooks(target, value) {
                let converted = result
                    .map_err(|message| DecodeError::new(self.path.clone(), message))?;
                self.input = Input::Value(Cow::Owned(converted));
            }
        }
        Ok(())
    }

    #[allow(clippy::float_cmp)]
    fn to_bool(&self) -> Result<bool> {
        let weak = self.weak();
        match self.leaf() {
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Integer(n)) if weak => Ok(*n != 0),
            Some(Value::Float(f)) if weak => Ok(*f != 0.0),
            Some(Value::String(s)) if weak && s.trim().is_empty() => Ok(false),
            Some(Value::String(s)) if weak => {
                parse_bool(s).ok_or_else(|| self.error(format!("cannot parse '{s}' as a bool")))
            }
            Some(Value::Null) if weak => Ok(false),
            _ => Err(self.mismatch("a bool")),
        }
    }

    fn to_integer(&self) -> Result<Integer> {
        let weak = self.weak();
        match self.leaf() {
            Some(Value::Integer(n)) => Ok(Integer::Signed(*n)),
            Some(Value::Float(f)) => float_to_integer(*f)
                .ok_or_else(|| self.error(format!("{f} does not fit in an integer"))),
            Some(Value::Bool(b)) if weak => Ok(Integer::Signed(i64::from(*b))),
            Some(Value::String(s)) if weak && s.trim().is_empty() => Ok(Integer::Signed(0)),
            Some(Value::String(s)) if weak => parse_integer(s)
                .ok_or_else(|| self.error(format!("cannot parse '{s}' as an integer"))),
            Some(Value::Duration(d)) if weak => i64::try_from(d.as_nanos())
                .map(Integer::Signed)
                .map_err(|_| self.error("duration does not fit in an integer")),
            Some(Value::Null) if weak => Ok(Integer::Signed(0)),
            _ => Err(self.mismatch("an integer")),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_float(&self) -> Result<f64> {
        let weak = self.weak();
        match self.leaf() {
            Some(Value::Float(f)) => Ok(*f),
            Some(Value::Integer(n)) => Ok(*n as f64),
            Some(Value::Bool(b)) if weak => Ok(if *b { 1.0 } else { 0.0 }),
            Some(Value::String(s)) if weak && s.trim().is_empty() => Ok(0.0),
            Some(Value::String(s)) if weak => s
                .trim()
                .parse()
                .map_err(|_| self.error(format!("cannot parse '{s}' as a float"))),
            Some(Value::Null) if weak => Ok(0.0),
            _ => Err(self.mismatch("a float")),
        }
    }

    fn to_text(&self) -> Result<Cow<'_, str>> {
        let weak = self.weak();
        match self.leaf() {
            Some(Value::String(s)) => Ok(Cow::Borrowed(s)),
            Some(Value::Bool(b)) if weak => Ok(Cow::Owned(b.to_string())),
            Some(Value::Integer(n)) if weak => Ok(Cow::Owned(n.to_string())),
            Some(Value::Float(f)) if weak => Ok(Cow::Owned(f.to_string())),
            Some(Value::Duration(d)) if weak => Ok(Cow::Owned(format_duration(*d))),
            Some(Value::Null) if weak => Ok(Cow::Borrowed("")),
            _ => Err(self.mismatch("a string")),
        }
    }

    fn deserialize_duration<'de, V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value> {
        self.apply_hooks(Target::Duration)?;
        if matches!(self.input, Input::Tree(_)) {
            // An explicit `secs`/`nanos` mapping.
            return self.deserialize_fields(Some(DURATION_FIELDS), visitor);
        }

        let weak = self.weak();
        let duration = match self.leaf() {
            Some(Value::Duration(d)) => *d,
            Some(Value::Integer(n)) if weak => u64::try_from(*n)
                .map(Duration::from_nanos)
                .map_err(|_| self.error(format!("negative duration {n}")))?,
            Some(Value::Null) if weak => Duration::ZERO,
            _ => return Err(self.mismatch("a duration")),
        };

        let parts = [duration.as_secs(), u64::from(duration.subsec_nanos())];
        visitor.visit_seq(SeqDeserializer::<_, DecodeError>::new(parts.into_iter()))
    }

    fn deserialize_fields<'de, V: Visitor<'de>>(
        self,
        fields: Option<&'static [&'static str]>,
        visitor: V,
    ) -> Result<V::Value> {
        let weak = self.weak();
        let Self {
            input,
            path,
            options,
        } = self;

        let tree = match input {
            Input::Tree(tree) => tree,
            Input::Value(value) if is_empty_leaf(&value, weak) => &EMPTY_TREE,
            other => {
                let expected = if fields.is_some() { "a struct" } else { "a mapping" };
                return Err(mismatch(&path, &other, expected));
            }
        };

        visitor
            .visit_map(TreeAccess::new(tree, fields, path.clone(), options))
            .map_err(|e| e.at(&path))
    }
}

fn mismatch(path: &str, input: &Input<'_>, expected: &str) -> DecodeError {
    let found = match input {
        Input::Tree(_) => "a mapping".to_string(),
        Input::Value(value) => match &**value {
            Value::Null => "null".to_string(),
            Value::Sequence(_) => "a sequence".to_string(),
            other => format!("{} `{other}`", other.kind()),
        },
    };
    DecodeError::new(path, format!("expected {expected}, found {found}"))
}

fn is_empty_leaf(value: &Value, weak: bool) -> bool {
    match value {
        Value::Null => true,
        Value::Sequence(items) => weak && items.is_empty(),
        _ => false,
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

/// Truncates `f` toward zero, or `None` when the result is outside both the
/// `i64` and the `u64` range.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn float_to_integer(f: f64) -> Option<Integer> {
    // 2^63 and 2^64 are exact in f64; the casts below only see values in range.
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    const U64_END: f64 = 18_446_744_073_709_551_616.0;

    let whole = f.trunc();
    if !whole.is_finite() {
        None
    } else if (-I64_END..I64_END).contains(&whole) {
        Some(Integer::Signed(whole as i64))
    } else if (0.0..U64_END).contains(&whole) {
        Some(Integer::Unsigned(whole as u64))
    } else {
        None
    }
}

/// Parses decimal, `0x`, `0o` and `0b` integers with an optional sign.
fn parse_integer(text: &str) -> Option<Integer> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (radix, digits) = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| unsigned.strip_prefix(prefix).map(|rest| (radix, rest)))
        .unwrap_or((10, unsigned));

    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude).map(Integer::Signed)
    } else {
        Some(i64::try_from(magnitude).map_or(Integer::Unsigned(magnitude), Integer::Signed))
    }
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value> {
            self.apply_hooks(Target::Integer)?;
            match self.to_integer()? {
                Integer::Signed(n) => visitor.visit_i64(n),
                Integer::Unsigned(n) => visitor.visit_u64(n),
            }
        }
    )*};
}

impl<'de, 'a> de::Deserializer<'de> for NodeDeserializer<'a> {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let Self {
            input,
            path,
            options,
        } = self;

        match input {
            Input::Tree(tree) => visitor.visit_map(TreeAccess::new(tree, None, path, options)),
            Input::Value(value) => match &*value {
                Value::Null => visitor.visit_unit(),
                Value::Bool(b) => visitor.visit_bool(*b),
                Value::Integer(n) => visitor.visit_i64(*n),
                Value::Float(f) => visitor.visit_f64(*f),
                Value::String(s) => visitor.visit_str(s),
                Value::Duration(d) => visitor.visit_string(format_duration(*d)),
                Value::Sequence(_) => visitor.visit_seq(SeqAccessor::new(value, path, options)),
            },
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value> {
        self.apply_hooks(Target::Bool)?;
        visitor.visit_bool(self.to_bool()?)
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value> {
        self.apply_hooks(Target::Float)?;
        visitor.visit_f64(self.to_float()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value> {
        self.apply_hooks(Target::String)?;
        let text = self.to_text()?;
        visitor.visit_str(&text)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if let Some(Value::String(s)) = self.leaf() {
            return visitor.visit_bytes(s.as_bytes());
        }
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.leaf().is_some_and(Value::is_null) {
            return visitor.visit_none();
        }
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let weak = self.weak();
        match self.leaf() {
            Some(Value::Null) => visitor.visit_unit(),
            Some(Value::String(s)) if weak && s.is_empty() => visitor.visit_unit(),
            _ => Err(self.mismatch("null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value> {
        self.apply_hooks(Target::Sequence)?;
        let weak = self.weak();
        let Self {
            input,
            path,
            options,
        } = self;

        match input {
            Input::Value(value)
                if weak || matches!(&*value, Value::Sequence(_) | Value::Null) =>
            {
                visitor.visit_seq(SeqAccessor::new(value, path, options))
            }
            other => Err(mismatch(&path, &other, "a sequence")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_fields(None, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if name == "Duration" && fields == DURATION_FIELDS {
            return self.deserialize_duration(visitor);
        }
        self.deserialize_fields(Some(fields), visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        mut self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.apply_hooks(Target::Enum(name))?;
        let Self {
            input,
            path,
            options,
        } = self;

        match input {
            Input::Value(value) => {
                if let Value::String(s) = &*value {
                    return visitor.visit_enum(StrDeserializer::<'_, DecodeError>::new(s));
                }
                Err(mismatch(&path, &Input::Value(value), "an enum variant"))
            }
            Input::Tree(tree) => match single_entry(tree) {
                Some((variant, node)) => {
                    let content = Self::node(node, child_path(&path, variant), options);
                    visitor.visit_enum(VariantNode { variant, content })
                }
                None => Err(mismatch(
                    &path,
                    &Input::Tree(tree),
                    "an enum variant or a single-key mapping",
                )),
            },
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

fn single_entry(tree: &Tree) -> Option<(&String, &Node)> {
    let mut entries = tree.iter();
    let first = entries.next()?;
    entries.next().is_none().then_some(first)
}

/// Map access over the entries of one branch.
struct TreeAccess<'a> {
    entries: btree_map::Iter<'a, String, Node>,
    pending: Option<(&'a String, &'a Node)>,
    fields: Option<&'static [&'static str]>,
    path: String,
    options: &'a DecoderOptions,
}

impl<'a> TreeAccess<'a> {
    fn new(
        tree: &'a Tree,
        fields: Option<&'static [&'static str]>,
        path: String,
        options: &'a DecoderOptions,
    ) -> Self {
        Self {
            entries: tree.iter(),
            pending: None,
            fields,
            path,
            options,
        }
    }

    /// The struct field `key` binds to: exact match first, then ignoring
    /// ASCII case. Unknown keys pass through unchanged.
    fn field_name(&self, key: &'a str) -> &'a str {
        let Some(fields) = self.fields else {
            return key;
        };
        fields
            .iter()
            .find(|field| **field == key)
            .or_else(|| fields.iter().find(|field| field.eq_ignore_ascii_case(key)))
            .map_or(key, |field| *field)
    }
}

impl<'de, 'a> MapAccess<'de> for TreeAccess<'a> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((key, node)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some((key, node));

        let name = self.field_name(key);
        seed.deserialize(StrDeserializer::<'_, DecodeError>::new(name))
            .map(Some)
            .map_err(|e| e.at(&child_path(&self.path, key)))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (key, node) = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::new(self.path.clone(), "value requested before its key"))?;

        let path = child_path(&self.path, key);
        seed.deserialize(NodeDeserializer::node(node, path.clone(), self.options))
            .map_err(|e| e.at(&path))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Sequence access over a leaf. Null yields no elements; a scalar yields
/// itself once.
struct SeqAccessor<'a> {
    items: Box<dyn Iterator<Item = Cow<'a, Value>> + 'a>,
    index: usize,
    path: String,
    options: &'a DecoderOptions,
}

impl<'a> SeqAccessor<'a> {
    fn new(value: Cow<'a, Value>, path: String, options: &'a DecoderOptions) -> Self {
        let items: Box<dyn Iterator<Item = Cow<'a, Value>> + 'a> = match value {
            Cow::Borrowed(Value::Sequence(items)) => Box::new(items.iter().map(Cow::Borrowed)),
            Cow::Owned(Value::Sequence(items)) => Box::new(items.into_iter().map(Cow::Owned)),
            Cow::Borrowed(Value::Null) | Cow::Owned(Value::Null) => Box::new(std::iter::empty()),
            scalar => Box::new(std::iter::once(scalar)),
        };
        Self {
            items,
            index: 0,
            path,
            options,
        }
    }
}

impl<'de, 'a> SeqAccess<'de> for SeqAccessor<'a> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let Some(item) = self.items.next() else {
            return Ok(None);
        };

        let path = format!("{}[{}]", self.path, self.index);
        self.index += 1;
        let element = NodeDeserializer {
            input: Input::Value(item),
            path: path.clone(),
            options: self.options,
        };
        seed.deserialize(element).map(Some).map_err(|e| e.at(&path))
    }
}

struct VariantNode<'a> {
    variant: &'a str,
    content: NodeDeserializer<'a>,
}

impl<'de, 'a> EnumAccess<'de> for VariantNode<'a> {
    type Error = DecodeError;
    type Variant = NodeDeserializer<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(StrDeserializer::<'_, DecodeError>::new(self.variant))?;
        Ok((variant, self.content))
    }
}

impl<'de, 'a> VariantAccess<'de> for NodeDeserializer<'a> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<()> {
        // A unit variant written as a branch must carry no content.
        de::Deserializer::deserialize_unit(self, de::IgnoredAny).map(|_| ())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_fields(Some(fields), visitor)
    }
}
