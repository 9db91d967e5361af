//! Key-sorted canonical JSON for diffing encoded documents.
//!
//! The document codec writes a fixed field order; this view ignores order
//! entirely so two documents can be compared for content only.

use anyhow::Context;
use serde_json::{Map, Value};
use std::{fs, path::Path};

/// Recursively sort object keys. Arrays keep their order.
///
/// ```
/// use serde_json::json;
/// use xr_config::json_norm::normalize_value;
///
/// let v = normalize_value(json!({"tag": "in", "port": 1}));
/// assert_eq!(v.to_string(), r#"{"port":1,"tag":"in"}"#);
/// ```
#[must_use]
pub fn normalize_value(v: Value) -> Value {
    match v {
        Value::Object(m) => {
            let mut entries: Vec<(String, Value)> = m.into_iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::new();
            for (k, vv) in entries {
                out.insert(k, normalize_value(vv));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_value).collect()),
        x => x,
    }
}

/// True when both values hold the same content regardless of key order.
pub fn same_content(a: &Value, b: &Value) -> bool {
    normalize_value(a.clone()) == normalize_value(b.clone())
}

/// Read a JSON file and return it key-sorted and pretty-printed.
///
/// # Errors
/// The file cannot be read or is not JSON.
pub fn normalize_file_to_string(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let v: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
    Ok(serde_json::to_string_pretty(&normalize_value(v))?)
}
