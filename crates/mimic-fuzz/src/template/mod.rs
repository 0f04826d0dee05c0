//! `{{ ... }}` templates evaluated against a data context.
//!
//! Text outside the delimiters is copied verbatim. Each action is either a
//! call in `Name arg1 arg2` form (see [`action`]) or a rhai expression, so
//! `{{ if VariableSize("items") > 2 { "many" } else { "few" } }}` works as
//! well as `{{RandIntMinMax 1 10}}`. `{{-` and `-}}` trim the whitespace on
//! their side, `{{/* ... */}}` is a comment.

pub mod action;
mod functions;

pub use functions::REQUEST_COUNT_KEY;

use crate::fixtures::FixtureStore;
use crate::generator::FuzzGenerator;
use crate::tags::TEMPLATE_MARKER;
use crate::value::Value;
use functions::{create_engine, dynamic_to_value, FunctionContext};
use parking_lot::Mutex;
use regex::Regex;
use rhai::Dynamic;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on rhai operations per action.
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

const CLOSE: &str = "}}";

static EMPTY_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn empty_line_regex() -> &'static Regex {
    EMPTY_LINE_REGEX.get_or_init(|| Regex::new(r"(?m)^\s*$[\r\n]*|[\r\n]+\s+\z").unwrap())
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to evaluate '{action}': {message}")]
    Eval { action: String, message: String },
    #[error("unterminated action starting at offset {offset}")]
    Unterminated { offset: usize },
}

#[derive(Debug, Clone)]
pub struct TemplateEngine {
    fixtures: FixtureStore,
    max_operations: u64,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            fixtures: FixtureStore::default(),
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }

    pub fn with_fixtures(mut self, fixtures: FixtureStore) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    pub fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    /// Render with a freshly seeded generator.
    pub fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        let generator = FuzzGenerator::new().with_fixtures(self.fixtures.clone());
        self.render_with(template, data, generator)
    }

    /// Render using `generator` for every random function in the template.
    pub fn render_with(
        &self,
        template: &str,
        data: &Value,
        generator: FuzzGenerator,
    ) -> Result<String, TemplateError> {
        if !template.contains(TEMPLATE_MARKER) {
            return Ok(template.to_string());
        }

        let ctx = FunctionContext {
            data: Arc::new(data.clone()),
            generator: Arc::new(Mutex::new(generator)),
            fixtures: self.fixtures.clone(),
        };
        let engine = create_engine(&ctx, self.max_operations);

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = rest.find(TEMPLATE_MARKER) {
            let text = &rest[..start];
            out.push_str(if trim_next { text.trim_start() } else { text });

            let body_start = start + TEMPLATE_MARKER.len();
            let Some(len) = rest[body_start..].find(CLOSE) else {
                return Err(TemplateError::Unterminated {
                    offset: offset + start,
                });
            };
            let mut body = &rest[body_start..body_start + len];

            if let Some(stripped) = body.strip_prefix('-') {
                if stripped.starts_with(char::is_whitespace) {
                    out.truncate(out.trim_end().len());
                    body = stripped;
                }
            }
            trim_next = false;
            if let Some(stripped) = body.strip_suffix('-') {
                if stripped.ends_with(char::is_whitespace) {
                    trim_next = true;
                    body = stripped;
                }
            }

            let consumed = body_start + len + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];

            let body = body.trim();
            if body.is_empty() || (body.starts_with("/*") && body.ends_with("*/")) {
                continue;
            }

            let expression = action::to_expression(body);
            let result = engine.eval::<Dynamic>(&expression).map_err(|err| {
                debug!(action = body, expression = %expression, "template action failed");
                TemplateError::Eval {
                    action: body.to_string(),
                    message: err.to_string(),
                }
            })?;
            if !result.is_unit() {
                out.push_str(&dynamic_to_value(result).to_string());
            }
        }
        out.push_str(if trim_next { rest.trim_start() } else { rest });

        Ok(empty_line_regex().replace_all(&out, "").into_owned())
    }
}

/// Render `template` against `data` with default settings.
pub fn render(template: &str, data: &Value) -> Result<String, TemplateError> {
    TemplateEngine::new().render(template, data).inspect_err(|err| {
        warn!(error = %err, "failed to execute template");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Value {
        Value::from(json!({
            "name": "Leanne",
            "status": "201",
            "elapsed": 12,
            "_RequestCount": "4",
            "user": {"id": 7, "tags": ["a", "b", "c"]},
            "items": [{"id": 1}, {"id": 2}]
        }))
    }

    fn engine() -> TemplateEngine {
        TemplateEngine::new()
    }

    fn render_seeded(template: &str) -> String {
        engine()
            .render_with(template, &data(), FuzzGenerator::seeded(9))
            .unwrap()
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let text = "no actions here\n\n";
        assert_eq!(engine().render(text, &data()).unwrap(), text);
    }

    #[test]
    fn test_data_lookups() {
        assert_eq!(render_seeded("hi {{.name}}!"), "hi Leanne!");
        assert_eq!(render_seeded("{{.user.id}}"), "7");
        assert_eq!(render_seeded("{{VariableSize \"user.tags\"}}"), "3");
        assert_eq!(render_seeded("{{VariableSize \"missing\"}}"), "-1");
        assert_eq!(render_seeded("{{.items.id}}"), "[1,2]");
    }

    #[test]
    fn test_predicates() {
        assert_eq!(render_seeded(r#"{{VariableContains "status" "2\d\d"}}"#), "true");
        assert_eq!(render_seeded(r#"{{VariableEquals "name" "Leanne"}}"#), "true");
        assert_eq!(render_seeded(r#"{{HasProperty "user.id"}}"#), "true");
        assert_eq!(render_seeded(r#"{{HasProperty "user.nope"}}"#), "false");
        assert_eq!(render_seeded("{{ResponseStatusMatches `20[01]`}}"), "true");
        assert_eq!(render_seeded("{{ResponseTimeMillisLE 12}}"), "true");
        assert_eq!(render_seeded(r#"{{NumPropertyGE "user.id" 7}}"#), "true");
        assert_eq!(render_seeded(r#"{{VariableSizeGE "user.tags" 4}}"#), "false");
    }

    #[test]
    fn test_request_counters() {
        assert_eq!(render_seeded("{{NthRequest 2}}"), "true");
        assert_eq!(render_seeded("{{NthRequest 3}}"), "false");
        assert_eq!(render_seeded("{{NthRequest 0}}"), "false");
        assert_eq!(render_seeded("{{LTRequest 5}}"), "true");
        assert_eq!(render_seeded("{{GERequest 5}}"), "false");
        let empty = engine()
            .render("{{LTRequest 5}}", &Value::Null)
            .unwrap();
        assert_eq!(empty, "false");
    }

    #[test]
    fn test_native_expressions() {
        assert_eq!(
            render_seeded(r#"{{ if VariableSize("user.tags") > 2 { "many" } else { "few" } }}"#),
            "many"
        );
        assert_eq!(render_seeded("{{ Add 2 3 }}"), "5");
        assert_eq!(render_seeded("{{ 1 + 2 }}"), "3");
    }

    #[test]
    fn test_random_functions() {
        let n: i64 = render_seeded("{{RandIntMinMax 10 20}}").parse().unwrap();
        assert!((10..=20).contains(&n));
        let id = render_seeded("{{UUID}}");
        assert_eq!(id.len(), 36);
        let pick = render_seeded("{{EnumString `red green` `blue`}}");
        assert!(["red", "green", "blue"].contains(&pick.as_str()), "{pick}");
        let digits = render_seeded(r"{{RandRegex `\d{4}`}}");
        assert!(digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()), "{digits}");
    }

    #[test]
    fn test_same_generator_seed_repeats() {
        let template = "{{RandName}} {{RandIntMax 1000}} {{RandWord 3 8}}";
        assert_eq!(render_seeded(template), render_seeded(template));
    }

    #[test]
    fn test_trim_markers_and_comments() {
        assert_eq!(render_seeded("a  {{- .name -}}  b"), "aLeanneb");
        assert_eq!(render_seeded("a{{/* note */}}b"), "ab");
    }

    #[test]
    fn test_empty_lines_removed() {
        let out = render_seeded("first\n\n   \n{{.name}}\n\n");
        assert_eq!(out, "first\nLeanne");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            engine().render("{{.name", &data()),
            Err(TemplateError::Unterminated { offset: 0 })
        ));
        let err = engine().render("x {{NoSuchFunction 1}}", &data()).unwrap_err();
        assert!(matches!(err, TemplateError::Eval { ref action, .. } if action == "NoSuchFunction 1"));
    }

    #[test]
    fn test_integer_overflow_is_an_eval_error() {
        let err = engine()
            .render("{{Add 9223372036854775807 1}}", &Value::Null)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Eval { ref message, .. } if message.contains("overflow")));
        assert_eq!(render_seeded("{{Add -5 3}}"), "-2");

        assert_eq!(render_seeded("{{ Nth(-9223372036854775807 - 1, -1) }}"), "false");
        assert_eq!(render_seeded("{{Nth 9 0}}"), "false");
        assert_eq!(render_seeded("{{Nth 9 3}}"), "true");
    }

    #[test]
    fn test_large_random_arguments_are_capped() {
        let out = render_seeded("{{RandString 100000000}}");
        assert_eq!(out.len(), crate::generator::data::MAX_RUN_LEN);
        let word = render_seeded("{{RandWord 1 9223372036854775807}}");
        assert!(word.len() <= crate::generator::data::MAX_RUN_LEN);
    }

    #[test]
    fn test_fixture_functions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cities.dat"), "Paris\nLima\n").unwrap();
        std::fs::write(dir.path().join("app.dat"), "port: 8080\n").unwrap();
        let engine = TemplateEngine::new().with_fixtures(FixtureStore::new(dir.path()));

        let city = engine.render("{{RandFileLine `cities`}}", &Value::Null).unwrap();
        assert!(city == "Paris" || city == "Lima");
        let a = engine.render("{{SeededFileLine `cities` 3}}", &Value::Null).unwrap();
        let b = engine.render("{{SeededFileLine `cities` 3}}", &Value::Null).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            engine.render("{{FileProperty `app` `port`}}", &Value::Null).unwrap(),
            "8080"
        );
        let bad = engine.render("{{RandFileLine `../x`}}", &Value::Null).unwrap();
        assert!(bad.contains("invalid file-name"), "{bad}");
    }
}
