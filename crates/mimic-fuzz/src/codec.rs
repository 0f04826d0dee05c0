//! Decoding of request/response bodies into [`Value`] trees.

use crate::extractor::extract_types;
use crate::flattener::{flat_regex_map_with_limit, RegexMap, DEFAULT_MAX_REGEX_LEN};
use crate::template_request::DataTemplateRequest;
use crate::value::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML body: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Decode a body: JSON when it opens with `{` or `[`, YAML otherwise.
/// An empty body is `Null`.
pub fn unmarshal_array_or_object(bytes: &[u8]) -> Result<Value, CodecError> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let json: serde_json::Value = serde_json::from_str(trimmed)?;
        return Ok(Value::from(json));
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(trimmed)?;
    Ok(Value::from(yaml))
}

/// Decode `text`, infer its type patterns and flatten them.
pub fn extract_regex_map(text: &str, request: &DataTemplateRequest) -> Result<RegexMap, CodecError> {
    extract_regex_map_with_limit(text, request, DEFAULT_MAX_REGEX_LEN)
}

pub fn extract_regex_map_with_limit(
    text: &str,
    request: &DataTemplateRequest,
    max_regex_len: usize,
) -> Result<RegexMap, CodecError> {
    let value = unmarshal_array_or_object(text.as_bytes())?;
    Ok(extract_types(&value, request)
        .map(|tagged| flat_regex_map_with_limit(&tagged, max_regex_len))
        .unwrap_or_default())
}

/// [`extract_regex_map`] serialized as a JSON object.
pub fn extract_regex_map_json(text: &str, request: &DataTemplateRequest) -> Result<String, CodecError> {
    let map = extract_regex_map(text, request)?;
    Ok(serde_json::to_string(&map)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate_regex_map;

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(unmarshal_array_or_object(b"").unwrap(), Value::Null);
        assert_eq!(unmarshal_array_or_object(b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_json_and_yaml_bodies() {
        let json = unmarshal_array_or_object(br#" {"a": [1, 2]} "#).unwrap();
        assert_eq!(json.get("a").and_then(|v| v.len()), Some(2));

        let yaml = unmarshal_array_or_object(b"name: mimic\nport: 80\n").unwrap();
        assert_eq!(yaml.get("name"), Some(Value::from("mimic")));
        assert_eq!(yaml.get("port"), Some(Value::Int(80)));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            unmarshal_array_or_object(b"{\"a\": "),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_extract_regex_map() {
        let body = r#"{"user": {"name": "Leanne", "id": 1}, "ok": true}"#;
        let map = extract_regex_map(body, &DataTemplateRequest::default()).unwrap();
        assert_eq!(map.len(), 3);
        assert!(map.contains_key("user.name"));
        assert!(map.contains_key("user.id"));
        assert!(map.contains_key("ok"));

        let value = unmarshal_array_or_object(body.as_bytes()).unwrap();
        validate_regex_map(&value, &map).unwrap();
    }

    #[test]
    fn test_extract_regex_map_json() {
        let out = extract_regex_map_json(r#"{"name": "x"}"#, &DataTemplateRequest::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["name"].as_str().unwrap().starts_with("(__string__"));
        assert_eq!(
            extract_regex_map_json("", &DataTemplateRequest::default()).unwrap(),
            "{}"
        );
    }
}
