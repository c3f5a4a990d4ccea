//! Field accessors for raw Vault JSON responses.
//!
//! Every lookup returns `Option`; a missing, mistyped or empty field is simply
//! absent. Callers decide on defaults.

use serde_json::{Map, Value};

/// Look up a child object. An empty `name` returns `parent` itself if it is an object.
pub fn object_at<'a>(parent: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    if name.is_empty() {
        return parent.as_object();
    }
    parent.get(name).and_then(Value::as_object)
}

/// Walk a chain of nested objects, e.g. `["data", "metadata"]`.
pub fn object_path<'a>(root: &'a Value, names: &[&str]) -> Option<&'a Map<String, Value>> {
    let mut current = root;
    for name in names {
        current = current.get(*name)?;
    }
    current.as_object()
}

/// Non-empty string field.
pub fn string_field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    object.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub fn bool_field(object: &Map<String, Value>, name: &str) -> Option<bool> {
    object.get(name).and_then(Value::as_bool)
}

pub fn u64_field(object: &Map<String, Value>, name: &str) -> Option<u64> {
    object.get(name).and_then(Value::as_u64)
}
