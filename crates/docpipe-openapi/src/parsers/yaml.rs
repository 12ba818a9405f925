//! YAML document parser
//!
//! Uses serde_yaml and converts the tree to a JSON value so that both
//! formats flow through the same description builder. Non-string mapping
//! keys (response codes such as `200:`) are rendered back to text.

use crate::error::DocumentError;
use crate::parsers::{DocumentParser, SourceFormat};
use serde::Deserialize;
use serde_yaml::Value as YamlValue;

/// YAML parser
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl DocumentParser for YamlParser {
    fn parse(&self, content: &str) -> Result<serde_json::Value, DocumentError> {
        let mut first = None;
        for doc in serde_yaml::Deserializer::from_str(content) {
            let value = YamlValue::deserialize(doc)
                .map_err(|e| DocumentError::format(format!("YAML parse error: {e}")))?;
            if !matches!(value, YamlValue::Null) {
                first = Some(value);
                break;
            }
        }

        match first {
            Some(value @ YamlValue::Mapping(_)) => Ok(to_json(value)),
            Some(_) => Err(DocumentError::format("YAML root is not a mapping")),
            None => Err(DocumentError::format("empty YAML document")),
        }
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Yaml
    }
}

/// Convert a YAML tree into a JSON tree
fn to_json(value: YamlValue) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        YamlValue::Null => Json::Null,
        YamlValue::Bool(b) => Json::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::from(i)
            } else if let Some(u) = n.as_u64() {
                Json::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Json::Null, Json::Number)
            }
        }
        YamlValue::String(s) => Json::String(s),
        YamlValue::Sequence(items) => Json::Array(items.into_iter().map(to_json).collect()),
        YamlValue::Mapping(map) => Json::Object(
            map.into_iter()
                .map(|(k, v)| (key_text(k), to_json(v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => to_json(tagged.value),
    }
}

fn key_text(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Tagged(tagged) => key_text(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_parser_valid() {
        let content = r"
openapi: 3.0.1
info:
  title: Sample API
  version: '1.0'
";
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(value["openapi"], "3.0.1");
        assert_eq!(value["info"]["title"], "Sample API");
    }

    #[test]
    fn yaml_numeric_keys_become_strings() {
        let content = r"
responses:
  200:
    description: ok
  404:
    description: missing
";
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(value["responses"]["200"]["description"], "ok");
        assert_eq!(value["responses"]["404"]["description"], "missing");
    }

    #[test]
    fn yaml_parser_takes_first_document() {
        let content = "---\nname: doc1\n---\nname: doc2\n";
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(value["name"], "doc1");
    }

    #[test]
    fn yaml_parser_empty() {
        assert!(YamlParser.parse("").is_err());
    }

    #[test]
    fn yaml_scalar_root_rejected() {
        let err = YamlParser.parse("hello world").unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }

    #[test]
    fn yaml_invalid_syntax() {
        let err = YamlParser.parse("key: [unclosed").unwrap_err();
        assert!(err.to_string().contains("YAML parse error"));
    }

    #[test]
    fn yaml_unquoted_version_is_number() {
        let value = YamlParser.parse("swagger: 2.0\n").unwrap();
        assert_eq!(value["swagger"].to_string(), "2.0");
    }
}
