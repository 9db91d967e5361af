//! Serde helpers shared by the settings records.
//! 配置记录共用的 serde 辅助工具。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use xr_types::{CodecError, CodecResult};

#[inline]
pub(crate) fn is_false(v: &bool) -> bool {
    !*v
}

#[inline]
pub(crate) fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Decode a JSON node, reporting failures as `MalformedDocument` at `path`.
pub(crate) fn decode_node<T: DeserializeOwned>(value: Value, path: &str) -> CodecResult<T> {
    serde_json::from_value(value).map_err(|e| CodecError::malformed_document(path, e.to_string()))
}

/// Settings blocks may be omitted or `null`; both mean "all defaults".
pub(crate) fn object_or_empty(value: Option<Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
        Some(v) => v,
    }
}

/// A field that may be written as a single value or a list.
///
/// Each value keeps the form it was decoded from, so re-encoding is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(list) => list.first(),
        }
    }

    pub fn to_vec(&self) -> Vec<&T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(list) => list.iter().collect(),
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(v: T) -> Self {
        Self::One(v)
    }
}

/// Scalar that upstream accepts as bool, number or string (`"16-32"`, `443`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_or_many_keeps_form() {
        let one: OneOrMany<String> = serde_json::from_str("\"a\"").unwrap();
        assert_eq!(one.first().map(String::as_str), Some("a"));
        assert_eq!(serde_json::to_string(&one).unwrap(), "\"a\"");

        let many: OneOrMany<String> = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(many.to_vec().len(), 2);
        assert_eq!(serde_json::to_string(&many).unwrap(), "[\"a\",\"b\"]");
    }

    #[test]
    fn decode_node_reports_path() {
        let err = decode_node::<Vec<u8>>(serde_json::json!("x"), "inbounds").unwrap_err();
        assert!(matches!(err, CodecError::MalformedDocument { ref path, .. } if path == "inbounds"));
        assert_eq!(object_or_empty(Some(Value::Null)), serde_json::json!({}));
    }

    #[test]
    fn scalar_accepts_mixed_types() {
        let v: Vec<ScalarValue> = serde_json::from_str("[true, 443, \"16-32\"]").unwrap();
        assert_eq!(v[0], ScalarValue::Bool(true));
        assert_eq!(v[1].to_string(), "443");
        assert_eq!(v[2], ScalarValue::from("16-32"));
    }
}
