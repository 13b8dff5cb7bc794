//! Key/value sanitization
//!
//! Turns a raw [`KeyValues`] sequence into a key-unique map. Malformed input
//! is repaired, never rejected: every problem is reported as a [`Misuse`] and
//! the offending pair is dropped.

use crate::{KeyValues, Value};
use std::collections::HashMap;

pub const ODD_PAIR_COUNT: &str = "odd number of key-value pairs in log message";
pub const INVALID_KEY_TYPE: &str = "invalid key type in log message, must always be string";
pub const INVALID_KEY: &str =
    "invalid key in log message, must be non-empty and contain no whitespace";
pub const INVALID_ERROR_TYPE: &str = "invalid error type in log message, must be a rich error";

/// Incorrect use of the logging API by its caller.
///
/// Each variant renders as a fixed message plus exactly one diagnostic field.
#[derive(Debug, Clone, PartialEq)]
pub enum Misuse {
    /// The sequence had an odd length; `count` is that length
    OddPairCount { count: usize },
    /// A key was not a string
    InvalidKeyType { actual_type: &'static str },
    /// A string key was empty or contained whitespace
    InvalidKey { key: String },
    /// A rich error was expected but something else was supplied
    InvalidErrorType { actual_type: &'static str },
}

impl Misuse {
    pub fn message(&self) -> &'static str {
        match self {
            Self::OddPairCount { .. } => ODD_PAIR_COUNT,
            Self::InvalidKeyType { .. } => INVALID_KEY_TYPE,
            Self::InvalidKey { .. } => INVALID_KEY,
            Self::InvalidErrorType { .. } => INVALID_ERROR_TYPE,
        }
    }

    /// The diagnostic field attached to the warning record
    pub fn field(&self) -> (String, Value) {
        match self {
            Self::OddPairCount { count } => ("count".to_string(), Value::from(*count)),
            Self::InvalidKeyType { actual_type } | Self::InvalidErrorType { actual_type } => {
                ("actual_type".to_string(), Value::from(*actual_type))
            }
            Self::InvalidKey { key } => ("key".to_string(), Value::from(key.as_str())),
        }
    }
}

/// Whether `key` may be used as a context or attribute key
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.chars().any(char::is_whitespace)
}

/// Sanitize `kv` into a map, reporting each problem through `report`.
///
/// Later duplicates overwrite earlier ones without a warning.
pub fn sanitize(kv: KeyValues, mut report: impl FnMut(Misuse)) -> HashMap<String, Value> {
    let items = kv.into_vec();
    if items.len() % 2 != 0 {
        report(Misuse::OddPairCount { count: items.len() });
    }

    let mut fields = HashMap::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let key = match key {
            Value::Str(key) => key,
            other => {
                report(Misuse::InvalidKeyType {
                    actual_type: other.type_name(),
                });
                continue;
            }
        };
        if !is_valid_key(&key) {
            report(Misuse::InvalidKey { key });
            continue;
        }
        fields.insert(key, value);
    }
    fields
}
