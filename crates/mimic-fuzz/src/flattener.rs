//! Flattening of tagged-pattern trees into a dotted-path regex map.
//!
//! Mapping keys extend the path with `.`; sequence elements share their
//! parent's path, so every element observed at one path is merged into a
//! single alternation.

use crate::tags::{wildcard_string_pattern, PREFIX_TYPE_ARRAY, WILD_REGEX};
use crate::value::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Dotted field path -> parenthesized alternation of regex bodies.
pub type RegexMap = BTreeMap<String, String>;

/// Alternations longer than this collapse to the wildcard.
pub const DEFAULT_MAX_REGEX_LEN: usize = 128;

/// Flatten a tagged-pattern tree with the default length threshold.
pub fn flat_regex_map(value: &Value) -> RegexMap {
    flat_regex_map_with_limit(value, DEFAULT_MAX_REGEX_LEN)
}

/// Flatten a tagged-pattern tree, collapsing any entry longer than
/// `max_len` to `.+`.
pub fn flat_regex_map_with_limit(value: &Value, max_len: usize) -> RegexMap {
    let mut regex = RegexMap::new();
    walk(value, &mut regex, "", false);
    for (key, pattern) in regex.iter_mut() {
        if pattern.len() > max_len {
            debug!(key = %key, len = pattern.len(), "simplifying regex");
            *pattern = WILD_REGEX.to_string();
        }
    }
    regex
}

fn walk(value: &Value, regex: &mut RegexMap, prefix: &str, array: bool) {
    match value {
        Value::Null => {}
        Value::Str(s) => add_value(regex, prefix, "", s, array),
        Value::StrMap(m) => {
            for (k, v) in m {
                add_value(regex, prefix, k, v, false);
            }
        }
        Value::Map(m) => {
            for (k, v) in m {
                walk(v, regex, &flat_key(prefix, k), false);
            }
        }
        Value::StrSeq(items) => {
            for s in items {
                add_value(regex, prefix, "", s, true);
            }
        }
        Value::Seq(items) => {
            for v in items {
                walk(v, regex, prefix, true);
            }
        }
        other => {
            debug!(kind = other.kind(), key = prefix, "cannot flat map value type");
        }
    }
}

/// Join a path prefix and key, tolerating an empty side.
pub fn flat_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else if key.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// True for a body mixing a word class with a digit class.
fn is_mixed(pattern: &str) -> bool {
    pattern.contains(r"\w") && (pattern.contains(r"\d") || pattern.contains("[0-9]"))
}

fn add_value(regex: &mut RegexMap, prefix: &str, key: &str, pattern: &str, array: bool) {
    let full_key = flat_key(prefix, key);
    let pattern = if is_mixed(pattern) {
        wildcard_string_pattern()
    } else {
        pattern.to_string()
    };
    let wrap = |body: &str| {
        if array {
            format!("{PREFIX_TYPE_ARRAY}({body})")
        } else {
            format!("({body})")
        }
    };

    let existing = regex.get(&full_key).filter(|old| !old.is_empty());
    let merged = match existing {
        None => wrap(&pattern),
        Some(old) => {
            // Alternatives are split on the raw `|`, so a body containing its
            // own alternation is never recognized as a duplicate.
            let start = old.find('(').map_or(0, |i| i + 1);
            let end = old.len().saturating_sub(1).max(start);
            let inner = &old[start..end];
            if inner.split('|').any(|part| part == pattern) {
                return;
            }
            wrap(&format!("{inner}|{pattern}"))
        }
    };
    regex.insert(full_key, merged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_types;
    use crate::tags::BOOLEAN_PREFIX_REGEX;
    use crate::template_request::DataTemplateRequest;
    use serde_json::json;

    fn extract(json: serde_json::Value) -> Value {
        extract_types(&Value::from(json), &DataTemplateRequest::default()).unwrap()
    }

    #[test]
    fn test_nested_keys_use_dots() {
        let map = flat_regex_map(&extract(json!({"a": {"b": {"c": "xyz"}}})));
        assert_eq!(map.get("a.b.c").map(String::as_str), Some(r"(__string__\w+)"));
    }

    #[test]
    fn test_arrays_share_parent_path() {
        let map = flat_regex_map(&extract(json!({"tags": ["abc", "12"]})));
        assert_eq!(map.len(), 1);
        assert_eq!(
            map["tags"],
            r"__array__(__string__\w+|__string__\d{2,2})"
        );
    }

    #[test]
    fn test_duplicate_shapes_are_not_repeated() {
        let map = flat_regex_map(&extract(json!([{"name": "ann"}, {"name": "bob"}])));
        assert_eq!(map["name"], r"(__string__\w+)");
    }

    #[test]
    fn test_mixed_shape_collapses_to_wildcard() {
        let map = flat_regex_map(&extract(json!({"street": "Apt. 556"})));
        assert_eq!(map["street"], "(__string__.+)");
        let map = flat_regex_map(&Value::from(json!({"code": r"__string__\w+[0-9]"})));
        assert_eq!(map["code"], "(__string__.+)");
    }

    #[test]
    fn test_long_alternation_collapses() {
        let items: Vec<serde_json::Value> = (1..=40)
            .map(|n| json!("7".repeat(n)))
            .collect();
        let map = flat_regex_map(&extract(json!({ "ids": items })));
        assert_eq!(map["ids"], ".+");
    }

    #[test]
    fn test_custom_limit() {
        let map = flat_regex_map_with_limit(&extract(json!({"a": "abc"})), 4);
        assert_eq!(map["a"], ".+");
    }

    #[test]
    fn test_string_map_entries() {
        let mut m = BTreeMap::new();
        m.insert("Content-Type".to_string(), "json".to_string());
        let map = flat_regex_map(&Value::StrMap(m));
        assert_eq!(map["Content-Type"], "(json)");
    }

    #[test]
    fn test_boolean_alternation_is_split_on_raw_bar() {
        let map = flat_regex_map(&extract(json!([{"ok": true}, {"ok": false}])));
        let expected = format!("({BOOLEAN_PREFIX_REGEX}|{BOOLEAN_PREFIX_REGEX})");
        assert_eq!(map["ok"], expected);
    }

    #[test]
    fn test_numbers_are_not_flattened() {
        let map = flat_regex_map(&Value::from(json!({"id": 1, "ok": null})));
        assert!(map.is_empty());
    }

    #[test]
    fn test_flat_key() {
        assert_eq!(flat_key("", "a"), "a");
        assert_eq!(flat_key("a", ""), "a");
        assert_eq!(flat_key("a", "b"), "a.b");
    }
}
