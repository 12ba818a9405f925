use docpipe_openapi::{parse_fetched, parse_markup, parse_raw_text, DocumentError, VersionRequirement};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const SAMPLE_YAML: &str = r"
openapi: 3.0.1
info:
  title: Sample API
  version: 1.0.0
  description: Minimal sample
paths:
  /users:
    get:
      summary: List users
      responses:
        200:
          description: ok
    post:
      summary: Create user
  /users/{id}:
    get:
      summary: Get user
components:
  schemas:
    User:
      type: object
      properties:
        id:
          type: integer
        name:
          type: string
";

#[test]
fn test_yaml_sample_parses() {
    let desc = parse_raw_text(SAMPLE_YAML, &VersionRequirement::default()).unwrap();
    assert_eq!(desc.title, "Sample API");
    assert_eq!(desc.version, "1.0.0");
    assert_eq!(desc.endpoint_count(), 3);
    assert_eq!(desc.model_count(), 1);
    assert_eq!(desc.models["User"].properties, vec!["id", "name"]);
}

#[test]
fn test_json_and_yaml_agree() {
    let from_yaml = parse_raw_text(SAMPLE_YAML, &VersionRequirement::default()).unwrap();

    let json_text = r#"{
        "openapi": "3.0.1",
        "info": {"title": "Sample API", "version": "1.0.0", "description": "Minimal sample"},
        "paths": {
            "/users": {"get": {"summary": "List users"}, "post": {"summary": "Create user"}},
            "/users/{id}": {"get": {"summary": "Get user"}}
        },
        "components": {"schemas": {"User": {"type": "object", "properties": {"id": {}, "name": {}}}}}
    }"#;
    let from_json = parse_raw_text(json_text, &VersionRequirement::default()).unwrap();

    assert_eq!(from_json, from_yaml);
}

#[test]
fn test_unsupported_version_rejected() {
    let text = SAMPLE_YAML.replace("openapi: 3.0.1", "openapi: 3.1.0");
    let err = parse_raw_text(&text, &VersionRequirement::default()).unwrap_err();
    assert_eq!(err, DocumentError::version("3.1.0", "3.0"));
}

#[test]
fn test_markup_with_embedded_document() {
    let html = format!(
        "<html><body><h1>Docs</h1><pre>{}</pre></body></html>",
        SAMPLE_YAML.replace('<', "&lt;")
    );
    let desc = parse_markup(&html, &VersionRequirement::default()).unwrap();
    assert_eq!(desc.title, "Sample API");
}

#[test]
fn test_markup_without_document_is_format_error() {
    let html = "<html><body><p>Nothing to see</p></body></html>";
    let err = parse_markup(html, &VersionRequirement::default()).unwrap_err();
    assert!(matches!(err, DocumentError::Format(_)));
}

#[test]
fn test_markup_version_failure_wins_over_format() {
    let html = r#"<script type="application/json">{"openapi": "2.9.0", "info": {}}</script><p>x</p>"#;
    let err = parse_markup(html, &VersionRequirement::default()).unwrap_err();
    assert!(err.is_version());
}

#[test]
fn test_fetched_structured_body_skips_extraction() {
    let desc = parse_fetched(SAMPLE_YAML, Some("application/yaml"), &VersionRequirement::default()).unwrap();
    assert_eq!(desc.endpoint_count(), 3);
}

fn document_with(paths: &[(String, Vec<&'static str>)], models: usize) -> Value {
    let mut path_map = Map::new();
    for (path, methods) in paths {
        let mut item = Map::new();
        for method in methods {
            item.insert((*method).to_string(), json!({"summary": format!("{method} {path}")}));
        }
        path_map.insert(path.clone(), Value::Object(item));
    }
    let mut schemas = Map::new();
    for i in 0..models {
        schemas.insert(format!("Model{i}"), json!({"type": "object"}));
    }
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Generated", "version": "0.1.0"},
        "paths": path_map,
        "components": {"schemas": schemas}
    })
}

fn methods_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(vec!["get", "put", "post", "delete", "patch"], 0..=5)
}

proptest! {
    #[test]
    fn prop_counts_match_source(
        paths in proptest::collection::btree_map("/[a-z]{1,8}", methods_strategy(), 0..8),
        models in 0usize..6,
        as_yaml in any::<bool>(),
    ) {
        let paths: Vec<_> = paths.into_iter().collect();
        let document = document_with(&paths, models);
        let text = if as_yaml {
            serde_yaml::to_string(&document).unwrap()
        } else {
            serde_json::to_string(&document).unwrap()
        };

        let desc = parse_raw_text(&text, &VersionRequirement::default()).unwrap();
        let expected: usize = paths.iter().map(|(_, m)| m.len()).sum();
        prop_assert_eq!(desc.endpoint_count(), expected);
        prop_assert_eq!(desc.model_count(), models);
    }

    #[test]
    fn prop_wrong_version_is_version_error(
        major in 0u32..10,
        minor in 0u32..10,
        patch in 0u32..10,
    ) {
        prop_assume!((major, minor) != (3, 0));
        let text = format!(r#"{{"openapi": "{major}.{minor}.{patch}", "info": {{"title": "t"}}}}"#);
        let err = parse_raw_text(&text, &VersionRequirement::default()).unwrap_err();
        prop_assert!(err.is_version(), "expected version error, got {:?}", err);
    }

    #[test]
    fn prop_unstructured_text_is_format_error(text in "[a-zA-Z0-9 ,.!-]{0,40}") {
        let err = parse_raw_text(&text, &VersionRequirement::default()).unwrap_err();
        prop_assert!(matches!(err, DocumentError::Format(_)), "got {:?}", err);
    }
}
