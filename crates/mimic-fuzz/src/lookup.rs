//! Dotted-path variable lookup and the predicates built on it.
//!
//! Sequences are traversed by broadcast: the remaining path is resolved
//! against every element and the non-absent results are collected, so
//! `attributes.username` over an array of objects yields every username.

use crate::value::Value;
use regex::Regex;
use tracing::warn;

/// Resolve `name` (e.g. `user.address.city`) against `data`.
///
/// Returns `None` when any segment is absent. An empty string inside a
/// string map and an explicit null inside a map both count as absent.
pub fn find_variable(name: &str, data: &Value) -> Option<Value> {
    let (head, rest) = match name.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (name, None),
    };

    match data {
        Value::StrMap(m) => {
            let val = m.get(head).filter(|v| !v.is_empty())?;
            match rest {
                None => Some(Value::Str(val.clone())),
                Some(rest) => find_variable(rest, &Value::Str(val.clone())),
            }
        }
        Value::Map(m) => {
            let val = m.get(head).filter(|v| !v.is_null())?;
            match rest {
                None => Some(val.clone()),
                Some(rest) => find_variable(rest, val),
            }
        }
        Value::Seq(items) => Some(Value::Seq(
            items
                .iter()
                .filter_map(|item| find_variable(name, item))
                .collect(),
        )),
        Value::StrSeq(_) => Some(Value::Seq(Vec::new())),
        _ => None,
    }
}

/// String-form equality against `target`.
pub fn variable_equals(name: &str, target: &str, data: &Value) -> bool {
    find_variable(name, data).is_some_and(|val| val.to_string() == target)
}

/// Regex search of `target` within the string form of the variable.
///
/// A malformed `target` is logged and treated as no match.
pub fn variable_contains(name: &str, target: &str, data: &Value) -> bool {
    let Some(val) = find_variable(name, data) else {
        return false;
    };
    match Regex::new(target) {
        Ok(re) => re.is_match(&val.to_string()),
        Err(err) => {
            warn!(name = name, regex = target, error = %err, "failed to compile regex");
            false
        }
    }
}

/// Numeric value of the variable, `0.0` when absent or not a number.
pub fn variable_number(name: &str, data: &Value) -> f64 {
    find_variable(name, data)
        .and_then(|val| val.to_string().trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Element or key count of the variable, `-1` for scalars or when absent.
pub fn variable_size(name: &str, data: &Value) -> i64 {
    find_variable(name, data)
        .and_then(|val| val.len())
        .map_or(-1, |n| n as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn data(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_find_simple() {
        assert_eq!(
            find_variable("k", &data(json!({"k": "1"}))),
            Some(Value::from("1"))
        );
        assert_eq!(find_variable("k", &data(json!({"x": "1"}))), None);
    }

    #[test]
    fn test_find_nested() {
        let d = data(json!({"user": {"address": {"city": "Gwenborough"}}}));
        assert_eq!(
            find_variable("user.address.city", &d),
            Some(Value::from("Gwenborough"))
        );
        assert_eq!(find_variable("user.address.zip", &d), None);
        assert_eq!(find_variable("user.address.city.more", &d), None);
    }

    #[test]
    fn test_find_broadcasts_over_arrays() {
        let d = data(json!({"attributes": [{"username": "a"}, {"username": "b"}]}));
        assert_eq!(
            find_variable("attributes.username", &d),
            Some(Value::Seq(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn test_broadcast_keeps_remaining_path() {
        let d = data(json!({"items": [{"a": {"b": 1}}, {"a": {"c": 2}}, {"a": {"b": 3}}]}));
        assert_eq!(
            find_variable("items.a.b", &d),
            Some(Value::Seq(vec![Value::Int(1), Value::Int(3)]))
        );
    }

    #[test]
    fn test_broadcast_without_hits_is_empty() {
        let d = data(json!({"items": [{"a": 1}]}));
        assert_eq!(find_variable("items.z", &d), Some(Value::Seq(vec![])));
        assert_eq!(variable_size("items.z", &d), 0);
    }

    #[test]
    fn test_empty_and_null_are_absent() {
        let mut m = BTreeMap::new();
        m.insert("k".to_string(), String::new());
        assert_eq!(find_variable("k", &Value::StrMap(m)), None);
        assert_eq!(find_variable("k", &data(json!({"k": null}))), None);
    }

    #[test]
    fn test_contains_is_regex_search() {
        assert!(variable_contains("k", "1", &data(json!({"k": "101"}))));
        assert!(!variable_contains("k", "10", &data(json!({"k": "201"}))));
        assert!(variable_contains("k", "^2.1$", &data(json!({"k": "201"}))));
        assert!(!variable_contains("missing", ".*", &data(json!({"k": "201"}))));
    }

    #[test]
    fn test_contains_swallows_invalid_regex() {
        assert!(!variable_contains("k", "[", &data(json!({"k": "["}))));
    }

    #[test]
    fn test_equals_uses_string_form() {
        let d = data(json!({"id": 12, "ok": true, "name": "x"}));
        assert!(variable_equals("id", "12", &d));
        assert!(variable_equals("ok", "true", &d));
        assert!(variable_equals("name", "x", &d));
        assert!(!variable_equals("missing", "", &d));
    }

    #[test]
    fn test_number() {
        let d = data(json!({"n": 4.5, "s": "12", "w": "abc"}));
        assert_eq!(variable_number("n", &d), 4.5);
        assert_eq!(variable_number("s", &d), 12.0);
        assert_eq!(variable_number("w", &d), 0.0);
        assert_eq!(variable_number("missing", &d), 0.0);
    }

    #[test]
    fn test_size() {
        let d = data(json!({"arr": [1, 2, 3], "obj": {"a": 1}, "s": "x"}));
        assert_eq!(variable_size("arr", &d), 3);
        assert_eq!(variable_size("obj", &d), 1);
        assert_eq!(variable_size("s", &d), -1);
        assert_eq!(variable_size("missing", &d), -1);
    }
}
