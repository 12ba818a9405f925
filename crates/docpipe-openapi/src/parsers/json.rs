//! JSON document parser

use crate::error::DocumentError;
use crate::parsers::{DocumentParser, SourceFormat};
use serde_json::Value;

/// JSON parser
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl DocumentParser for JsonParser {
    fn parse(&self, content: &str) -> Result<Value, DocumentError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| DocumentError::format(format!("JSON parse error: {e}")))?;

        if !value.is_object() {
            return Err(DocumentError::format("JSON root is not an object"));
        }
        Ok(value)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn priority(&self) -> i32 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_parser_valid() {
        let value = JsonParser.parse(r#"{"openapi": "3.0.0", "info": {"title": "t"}}"#).unwrap();
        assert_eq!(value["info"]["title"], "t");
    }

    #[test]
    fn json_parser_invalid() {
        let err = JsonParser.parse(r#"{"openapi": }"#).unwrap_err();
        assert!(err.to_string().contains("JSON parse error"));
    }

    #[test]
    fn json_parser_rejects_scalar_root() {
        assert!(JsonParser.parse("42").is_err());
        assert!(JsonParser.parse("\"text\"").is_err());
    }

    #[test]
    fn json_parser_empty() {
        assert!(JsonParser.parse("").is_err());
    }
}
