//! Structured-data parsers for raw document text
//!
//! Raw text goes through the parser chain in priority order:
//! - JSON via serde_json
//! - YAML via serde_yaml (the fallback markup language)
//!
//! The first parser that yields a mapping wins.

use crate::error::DocumentError;
use serde_json::Value;

mod json;
mod yaml;

pub use json::JsonParser;
pub use yaml::YamlParser;

/// Source format of a parsed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// JSON text
    Json,
    /// YAML text
    Yaml,
}

/// Parser trait for converting raw text into a document tree
pub trait DocumentParser: Send + Sync + 'static {
    /// Parse content into a document root
    ///
    /// # Errors
    /// [`DocumentError::Format`] when the text is not valid for this format
    /// or its root is not a mapping.
    fn parse(&self, content: &str) -> Result<Value, DocumentError>;

    /// Format this parser reads
    fn format(&self) -> SourceFormat;

    /// Parser priority (higher = tried first)
    fn priority(&self) -> i32 {
        0
    }
}

/// Ordered parser chain
pub struct ParserChain {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl std::fmt::Debug for ParserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserChain")
            .field("formats", &self.parsers.iter().map(|p| p.format()).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ParserChain {
    fn default() -> Self {
        let mut chain = Self::empty();
        chain.register(JsonParser);
        chain.register(YamlParser);
        chain
    }
}

impl ParserChain {
    /// Create chain with no parsers
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Register a parser, keeping the chain sorted by priority
    pub fn register<P: DocumentParser>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
        self.parsers.sort_by_key(|p| std::cmp::Reverse(p.priority()));
    }

    /// Parse with the first parser that accepts the text
    ///
    /// # Errors
    /// [`DocumentError::Format`] listing each parser's failure when none succeeds.
    pub fn parse(&self, content: &str) -> Result<(Value, SourceFormat), DocumentError> {
        let mut failures = Vec::with_capacity(self.parsers.len());
        for parser in &self.parsers {
            match parser.parse(content) {
                Ok(value) => return Ok((value, parser.format())),
                Err(e) => {
                    tracing::trace!(format = ?parser.format(), error = %e, "parser rejected input");
                    failures.push(e.to_string());
                }
            }
        }
        Err(DocumentError::format(if failures.is_empty() {
            "no parsers registered".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_tried_before_yaml() {
        let chain = ParserChain::default();
        let (_, format) = chain.parse(r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(format, SourceFormat::Json);

        let (_, format) = chain.parse("openapi: 3.0.0\n").unwrap();
        assert_eq!(format, SourceFormat::Yaml);
    }

    #[test]
    fn chain_reports_every_failure() {
        let chain = ParserChain::default();
        let err = chain.parse("just a sentence").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("JSON"));
        assert!(message.contains("YAML"));
    }

    #[test]
    fn empty_chain_fails() {
        assert!(ParserChain::empty().parse("{}").is_err());
    }
}
