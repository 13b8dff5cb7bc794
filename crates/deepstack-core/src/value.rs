//! Attribute values and key/value input lists
//!
//! Every logging and enrichment call takes a [`KeyValues`]: a flat, ordered
//! sequence alternating key, value, key, value. It can be built from typed
//! pairs (`[("user", "bob")]`, `Vec<(String, Value)>`) whose keys are always
//! strings, or from a dynamic list via [`kv!`](crate::kv) whose keys may be
//! any [`Value`] and are validated at runtime.

use crate::error::RichError;
use serde::{Serialize, Serializer};
use std::fmt;

/// An attribute value attached to a log record or an error context
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Json(serde_json::Value),
    Error(ErrorValue),
}

/// An error attached as a value.
///
/// The rich-error capability is resolved once, when the error is converted
/// into a value: rich errors keep their stack trace and context, everything
/// else is reduced to its textual description.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorValue {
    Rich(RichError),
    Opaque(String),
}

impl ErrorValue {
    /// Wrap any error, keeping the rich capability when the error is a [`RichError`]
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        match err.downcast_ref::<RichError>() {
            Some(rich) => Self::Rich(rich.clone()),
            None => Self::Opaque(err.to_string()),
        }
    }

    /// A foreign error known only by its description
    pub fn opaque(description: impl Into<String>) -> Self {
        Self::Opaque(description.into())
    }

    pub fn as_rich(&self) -> Option<&RichError> {
        match self {
            Self::Rich(rich) => Some(rich),
            Self::Opaque(_) => None,
        }
    }

    /// Textual description (the message for rich errors)
    pub fn description(&self) -> &str {
        match self {
            Self::Rich(rich) => rich.message(),
            Self::Opaque(text) => text,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Rich(_) => "rich_error",
            Self::Opaque(_) => "error",
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<RichError> for ErrorValue {
    fn from(err: RichError) -> Self {
        Self::Rich(err)
    }
}

impl From<&RichError> for ErrorValue {
    fn from(err: &RichError) -> Self {
        Self::Rich(err.clone())
    }
}

impl From<anyhow::Error> for ErrorValue {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<RichError>() {
            Some(rich) => Self::Rich(rich.clone()),
            None => Self::Opaque(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ErrorValue {
    fn from(err: std::io::Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ErrorValue {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::from_error(err.as_ref())
    }
}

impl Value {
    /// Wrap an error value (see [`ErrorValue::from_error`])
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::Error(ErrorValue::from_error(err))
    }

    /// Type name reported in misuse warnings
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I64(_) => "int",
            Self::U64(_) => "uint",
            Self::F64(_) => "float",
            Self::Str(_) => "string",
            Self::Json(_) => "json",
            Self::Error(err) => err.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rich_error(&self) -> Option<&RichError> {
        match self {
            Self::Error(err) => err.as_rich(),
            _ => None,
        }
    }

    /// JSON form used by structured sinks. Errors serialize as their description.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::I64(n) => serde_json::Value::from(*n),
            Self::U64(n) => serde_json::Value::from(*n),
            Self::F64(n) => serde_json::Value::from(*n),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Json(v) => v.clone(),
            Self::Error(err) => serde_json::Value::String(err.description().to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::I64(n) => write!(f, "{}", n),
            Self::U64(n) => write!(f, "{}", n),
            Self::F64(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
            Self::Json(v) => write!(f, "{}", v),
            Self::Error(err) => write!(f, "{}", err),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::I64(n) => serializer.serialize_i64(*n),
            Self::U64(n) => serializer.serialize_u64(*n),
            Self::F64(n) => serializer.serialize_f64(*n),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Json(v) => v.serialize(serializer),
            Self::Error(err) => serializer.serialize_str(err.description()),
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Self::I64(n as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Self::U64(n as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::F64(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::F64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Self::Error(err)
    }
}

impl From<RichError> for Value {
    fn from(err: RichError) -> Self {
        Self::Error(ErrorValue::Rich(err))
    }
}

impl From<&RichError> for Value {
    fn from(err: &RichError) -> Self {
        Self::Error(ErrorValue::Rich(err.clone()))
    }
}

impl From<anyhow::Error> for Value {
    fn from(err: anyhow::Error) -> Self {
        Self::Error(err.into())
    }
}

impl From<std::io::Error> for Value {
    fn from(err: std::io::Error) -> Self {
        Self::Error(err.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Flat key/value sequence: key, value, key, value, ...
///
/// May be malformed (odd length, non-string keys); the logger sanitizes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValues(Vec<Value>);

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pair
    pub fn with(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.0.push(key.into());
        self.0.push(value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<()> for KeyValues {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<Value>> for KeyValues {
    fn from(items: Vec<Value>) -> Self {
        Self(items)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for KeyValues
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V> From<Vec<(K, V)>> for KeyValues
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for KeyValues
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut items = Vec::with_capacity(iter.size_hint().0 * 2);
        for (key, value) in iter {
            items.push(Value::Str(key.into()));
            items.push(value.into());
        }
        Self(items)
    }
}

/// Build a dynamic [`KeyValues`] from alternating keys and values.
///
/// ```
/// use deepstack_core::kv;
///
/// let pairs = kv!["user", "bob", "attempt", 3];
/// assert_eq!(pairs.len(), 4);
/// ```
#[macro_export]
macro_rules! kv {
    () => {
        $crate::KeyValues::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::KeyValues::from(vec![$($crate::Value::from($item)),+])
    };
}
