//! JSON record decoding

use crate::error::{Error, Result};
use serde_json::Value;

/// Records path used when a stream does not configure one: a top-level array
pub const DEFAULT_RECORDS_PATH: &str = "$[*]";

/// Trait for extracting records from parsed response bodies
pub trait RecordDecoder: Send + Sync {
    /// Extract records from an already parsed body
    fn records(&self, value: &Value) -> Result<Vec<Value>>;
}

/// JSON decoder with a record path
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: String,
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::with_path(DEFAULT_RECORDS_PATH)
    }
}

impl JsonDecoder {
    /// Create a decoder for top-level arrays
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: path.into(),
        }
    }

    /// The configured record path
    pub fn record_path(&self) -> &str {
        &self.record_path
    }
}

impl RecordDecoder for JsonDecoder {
    fn records(&self, value: &Value) -> Result<Vec<Value>> {
        extract_records(value, &self.record_path)
    }
}

/// Extract the records addressed by `path`
///
/// Missing keys and `[*]` over a non-array are errors: silently yielding no
/// records would end pagination early.
pub fn extract_records(value: &Value, path: &str) -> Result<Vec<Value>> {
    match parse_simple_path(path) {
        Some(simple) => extract_simple(value, path, &simple),
        None => extract_with_jsonpath(value, path),
    }
}

/// A path made of plain keys, optionally ending in `[*]`
#[derive(Debug, PartialEq, Eq)]
struct SimplePath<'a> {
    keys: Vec<&'a str>,
    wildcard: bool,
}

fn parse_simple_path(path: &str) -> Option<SimplePath<'_>> {
    let rest = path.trim().strip_prefix('$')?;
    let (rest, wildcard) = match rest.strip_suffix("[*]") {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };

    if rest.is_empty() {
        return Some(SimplePath {
            keys: Vec::new(),
            wildcard,
        });
    }

    let keys: Vec<&str> = rest.strip_prefix('.')?.split('.').collect();
    let plain = keys.iter().all(|k| {
        !k.is_empty()
            && k
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    });

    plain.then_some(SimplePath { keys, wildcard })
}

fn extract_simple(value: &Value, path: &str, simple: &SimplePath<'_>) -> Result<Vec<Value>> {
    let mut current = value;
    for key in &simple.keys {
        current = match current {
            Value::Object(map) => map
                .get(*key)
                .ok_or_else(|| Error::extraction(path, format!("key '{key}' not found")))?,
            other => {
                return Err(Error::extraction(
                    path,
                    format!("cannot read key '{key}' from {}", kind(other)),
                ))
            }
        };
    }

    match current {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(_) if !simple.wildcard => Ok(vec![current.clone()]),
        other => Err(Error::extraction(
            path,
            format!("expected an array of records, found {}", kind(other)),
        )),
    }
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
