//! Validation of live values against a flattened regex map.
//!
//! The walk mirrors [`crate::flattener`]: same key construction, and every
//! sequence element is checked against the one path-level pattern. Paths with
//! no entry are unconstrained.

use crate::flattener::{flat_key, RegexMap};
use crate::tags::strip_type_tags;
use crate::value::Value;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("key '{key}' - value '{actual}' didn't match regex '{pattern}'")]
    Mismatch {
        key: String,
        pattern: String,
        actual: String,
    },
    #[error("key '{key}' has invalid regex '{pattern}': {source}")]
    InvalidPattern {
        key: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ValidationError {
    pub fn key(&self) -> &str {
        match self {
            ValidationError::Mismatch { key, .. } | ValidationError::InvalidPattern { key, .. } => {
                key
            }
        }
    }
}

/// Check `value` against `regex`, failing on the first mismatch.
pub fn validate_regex_map(value: &Value, regex: &RegexMap) -> Result<(), ValidationError> {
    RegexMapValidator::new(regex).validate(value)
}

/// Validator that compiles each stored pattern at most once.
///
/// Useful when many values are checked against the same map.
pub struct RegexMapValidator<'a> {
    regex: &'a RegexMap,
    compiled: HashMap<String, Regex>,
}

impl<'a> RegexMapValidator<'a> {
    pub fn new(regex: &'a RegexMap) -> Self {
        Self {
            regex,
            compiled: HashMap::new(),
        }
    }

    pub fn validate(&mut self, value: &Value) -> Result<(), ValidationError> {
        self.walk(value, "")
    }

    fn walk(&mut self, value: &Value, prefix: &str) -> Result<(), ValidationError> {
        match value {
            Value::Null | Value::Unsupported(_) => Ok(()),
            Value::StrMap(m) => {
                for (k, v) in m {
                    self.check(&flat_key(prefix, k), v)?;
                }
                Ok(())
            }
            Value::Map(m) => {
                for (k, v) in m {
                    self.walk(v, &flat_key(prefix, k))?;
                }
                Ok(())
            }
            Value::StrSeq(items) => {
                for s in items {
                    self.check(prefix, s)?;
                }
                Ok(())
            }
            Value::Seq(items) => {
                for v in items {
                    self.walk(v, prefix)?;
                }
                Ok(())
            }
            scalar => self.check(prefix, &scalar.to_string()),
        }
    }

    fn check(&mut self, key: &str, actual: &str) -> Result<(), ValidationError> {
        let Some(stored) = self.regex.get(key).filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        if !self.compiled.contains_key(key) {
            let pattern = strip_type_tags(stored);
            let re = Regex::new(&pattern).map_err(|source| ValidationError::InvalidPattern {
                key: key.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            self.compiled.insert(key.to_string(), re);
        }
        match self.compiled.get(key) {
            Some(re) if re.is_match(actual) => Ok(()),
            Some(re) => Err(ValidationError::Mismatch {
                key: key.to_string(),
                pattern: re.as_str().to_string(),
                actual: actual.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract_types;
    use crate::flattener::flat_regex_map;
    use crate::template_request::DataTemplateRequest;
    use serde_json::json;

    fn regex_map(json: serde_json::Value) -> RegexMap {
        let tagged = extract_types(&Value::from(json), &DataTemplateRequest::default()).unwrap();
        flat_regex_map(&tagged)
    }

    #[test]
    fn test_source_validates_against_its_own_map() {
        let sample = json!({
            "name": "Leanne Graham",
            "zip": "92998-3874",
            "lat": "-37.3159",
            "tags": ["a", "b"]
        });
        let map = regex_map(sample.clone());
        validate_regex_map(&Value::from(sample), &map).unwrap();
    }

    #[test]
    fn test_mismatch_reports_key_pattern_actual() {
        let mut map = RegexMap::new();
        map.insert("user.zip".into(), r"(__string__\d{5,5})".into());
        let err =
            validate_regex_map(&Value::from(json!({"user": {"zip": "abc"}})), &map).unwrap_err();
        match err {
            ValidationError::Mismatch {
                key,
                pattern,
                actual,
            } => {
                assert_eq!(key, "user.zip");
                assert_eq!(pattern, r"(\d{5,5})");
                assert_eq!(actual, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_keys_are_unconstrained() {
        let map = regex_map(json!({"a": "abc"}));
        validate_regex_map(&Value::from(json!({"b": "!!!", "a": "xyz"})), &map).unwrap();
    }

    #[test]
    fn test_substring_search_semantics() {
        let mut map = RegexMap::new();
        map.insert("k".into(), r"(\d{2,2})".into());
        validate_regex_map(&Value::from(json!({"k": "ab12cd"})), &map).unwrap();
    }

    #[test]
    fn test_every_array_element_is_checked() {
        let mut map = RegexMap::new();
        map.insert("ids".into(), r"__array__(__string__^\d+$)".into());
        let err = validate_regex_map(&Value::from(json!({"ids": ["1", "2", "x"]})), &map)
            .unwrap_err();
        assert_eq!(err.key(), "ids");
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_invalid_pattern_is_distinct_error() {
        let mut map = RegexMap::new();
        map.insert("k".into(), "(__string__[a-".into());
        let err = validate_regex_map(&Value::from(json!({"k": "a"})), &map).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPattern { .. }));
    }

    #[test]
    fn test_scalars_use_string_form() {
        let mut map = RegexMap::new();
        map.insert("ok".into(), "(__boolean__(false|true))".into());
        map.insert("n".into(), r"(__number__[+-]?\d{1,10})".into());
        validate_regex_map(&Value::from(json!({"ok": true, "n": -42})), &map).unwrap();
        assert!(validate_regex_map(&Value::from(json!({"n": "x"})), &map).is_err());
    }

    #[test]
    fn test_string_map_entries() {
        let mut map = RegexMap::new();
        map.insert("Accept".into(), "(json)".into());
        let mut headers = std::collections::BTreeMap::new();
        headers.insert("Accept".to_string(), "text/html".to_string());
        assert!(validate_regex_map(&Value::StrMap(headers), &map).is_err());
    }

    #[test]
    fn test_null_always_passes() {
        let map = regex_map(json!({"a": "abc"}));
        validate_regex_map(&Value::Null, &map).unwrap();
        validate_regex_map(&Value::from(json!({"a": null})), &map).unwrap();
    }

    #[test]
    fn test_unsupported_leaves_are_skipped() {
        let mut map = RegexMap::new();
        map.insert("a".into(), r"(__number__^\d+$)".into());
        map.insert("b".into(), r"(__number__^\d+$)".into());
        let value = Value::Map(
            [
                ("a".to_string(), Value::Unsupported("yaml tag !custom".into())),
                ("b".to_string(), Value::Int(7)),
            ]
            .into(),
        );
        let mut validator = RegexMapValidator::new(&map);
        validator.validate(&value).unwrap();
        validator.validate(&Value::Unsupported("yaml tag !x".into())).unwrap();

        let bad = Value::Map([("b".to_string(), Value::from("x"))].into());
        assert_eq!(validator.validate(&bad).unwrap_err().key(), "b");
    }
}
