//! Integration tests for template rendering with fixtures and configuration.

use mimic_fuzz::template::REQUEST_COUNT_KEY;
use mimic_fuzz::{
    unmarshal_array_or_object, FixtureStore, FuzzConfig, FuzzGenerator, TemplateEngine, Value,
};
use serde_json::json;
use std::fs;

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cities.dat"), "Paris\nLima\nOslo\n").unwrap();
    fs::write(
        dir.path().join("service.dat"),
        "name: billing\nreplicas: 3\nzones: [a, b]\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_response_body_template() {
    let dir = fixture_dir();
    let config = FuzzConfig::from_yaml(&format!(
        "fixtures_dir: {}\nseed: 99\n",
        dir.path().display()
    ))
    .unwrap();
    let engine = TemplateEngine::new().with_fixtures(FixtureStore::new(dir.path()));
    let data = unmarshal_array_or_object(br#"{"user": {"id": 42, "roles": ["a", "b"]}}"#).unwrap();

    let template = r#"{
  "id": {{.user.id}},
  "city": "{{RandFileLine `cities`}}",
  "service": "{{FileProperty `service` `name`}}",
  "multi_role": {{VariableSizeGE "user.roles" 2}},
  "zones": {{FileProperty `service` `zones`}}
}"#;

    let out = engine
        .render_with(template, &data, FuzzGenerator::from_config(&config))
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["id"], json!(42));
    assert!(["Paris", "Lima", "Oslo"].contains(&parsed["city"].as_str().unwrap()));
    assert_eq!(parsed["service"], json!("billing"));
    assert_eq!(parsed["multi_role"], json!(true));
    assert_eq!(parsed["zones"], json!(["a", "b"]));
}

#[test]
fn test_seeded_config_renders_identically() {
    let config = FuzzConfig::from_yaml("seed: 5").unwrap();
    let engine = TemplateEngine::new();
    let template = "{{RandName}}-{{RandIntMinMax 1 1000}}-{{UUID}}";
    let a = engine
        .render_with(template, &Value::Null, FuzzGenerator::from_config(&config))
        .unwrap();
    let b = engine
        .render_with(template, &Value::Null, FuzzGenerator::from_config(&config))
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_request_count_drives_predicates() {
    let engine = TemplateEngine::new();
    let template = "{{ if NthRequest(3) { \"throttled\" } else { \"ok\" } }}";
    let statuses: Vec<String> = (1..=6)
        .map(|count| {
            let data = Value::Map(
                [(REQUEST_COUNT_KEY.to_string(), Value::from(count.to_string()))].into(),
            );
            engine.render(template, &data).unwrap()
        })
        .collect();
    assert_eq!(statuses, ["ok", "ok", "throttled", "ok", "ok", "throttled"]);
}

#[test]
fn test_tagged_template_values_are_rendered_by_generator() {
    let dir = fixture_dir();
    let tagged = Value::from(json!({
        "city": "{{SeededFileLine `cities` 17}}",
        "count": "{{RandIntMinMax 3 4}}"
    }));
    let mut generator = FuzzGenerator::seeded(1).with_fixtures(FixtureStore::new(dir.path()));
    let out = generator.generate(&tagged);
    let city = out.get("city").unwrap();
    assert!(["Paris", "Lima", "Oslo"].contains(&city.as_str().unwrap()));
    assert_eq!(out.get("count"), Some(Value::from("3")));
}
