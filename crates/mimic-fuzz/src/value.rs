//! Value tree shared by extraction, flattening, validation and generation.
//!
//! The model mirrors decoded JSON/YAML bodies plus the string-only maps used
//! for headers and query parameters. Every transform in this crate preserves
//! container shape; only scalar leaves change representation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A decoded body, parameter map or tagged-pattern tree.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// String-only mapping (headers, query parameters). Treated as already typed.
    StrMap(BTreeMap<String, String>),
    Map(BTreeMap<String, Value>),
    StrSeq(Vec<String>),
    Seq(Vec<Value>),
    /// A node this engine cannot interpret, e.g. a YAML custom-tagged value.
    /// Holds a short description of the node kind.
    Unsupported(String),
}

impl Value {
    /// Short kind name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::StrMap(_) => "string-map",
            Value::Map(_) => "map",
            Value::StrSeq(_) => "string-seq",
            Value::Seq(_) => "seq",
            Value::Unsupported(_) => "unsupported",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Element or key count for containers, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::StrMap(m) => Some(m.len()),
            Value::Map(m) => Some(m.len()),
            Value::StrSeq(s) => Some(s.len()),
            Value::Seq(s) => Some(s.len()),
            _ => None,
        }
    }

    /// Member lookup on either map kind.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::StrMap(m) => m.get(key).map(|v| Value::Str(v.clone())),
            Value::Map(m) => m.get(key).cloned(),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// String form used for regex matching and predicate comparisons.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Unsupported(kind) => write!(f, "<{kind}>"),
            _ => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(m: BTreeMap<String, String>) -> Self {
        Value::StrMap(m)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(arr) => Value::Seq(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;
        match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            Yaml::String(s) => Value::Str(s),
            Yaml::Sequence(seq) => Value::Seq(seq.into_iter().map(Value::from).collect()),
            Yaml::Mapping(mapping) => Value::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Value::Unsupported(format!("yaml tag {}", tagged.tag)),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Uint(7).to_string(), "7");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!(Value::Float(-13.5).to_string(), "-13.5");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_display_containers_as_json() {
        let v = Value::Seq(vec![Value::from("a"), Value::Int(1)]);
        assert_eq!(v.to_string(), r#"["a",1]"#);
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(json!(1)), Value::Int(1));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Uint(u64::MAX));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn test_from_yaml_tagged_is_unsupported() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("k: !custom 3").unwrap();
        let value = Value::from(yaml);
        match value.get("k") {
            Some(Value::Unsupported(kind)) => assert!(kind.contains("custom")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_len_and_get() {
        let mut m = BTreeMap::new();
        m.insert("k".to_string(), "v".to_string());
        let v = Value::StrMap(m);
        assert_eq!(v.len(), Some(1));
        assert_eq!(v.get("k"), Some(Value::from("v")));
        assert_eq!(Value::Int(1).len(), None);
    }
}
