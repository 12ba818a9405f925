//! Parsed API description model
//!
//! The structured result of parsing an OpenAPI (or Swagger 2.x) document:
//! title, version, description, ordered endpoints and named models.

use crate::error::DocumentError;
use crate::version::VersionRequirement;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP methods recognised as operations under a path item
const OPERATION_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// One operation exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Upper-case HTTP method
    pub method: String,
    /// Path template, e.g. `/pets/{id}`
    pub path: String,
    /// Operation summary (falls back to operationId, then empty)
    #[serde(default)]
    pub summary: String,
}

impl Endpoint {
    /// Create endpoint
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            summary: summary.into(),
        }
    }
}

/// A named schema from the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Schema description, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Property names in document order
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Structured result of a successful parse
///
/// Immutable once produced; a new parse replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedApiDescription {
    /// `info.title`
    pub title: String,
    /// `info.version`
    #[serde(default)]
    pub version: String,
    /// `info.description`
    #[serde(default)]
    pub description: String,
    /// Endpoints in document order
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Models by name, in document order
    #[serde(default)]
    pub models: IndexMap<String, ModelDescription>,
    /// Specification version marker the description was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
}

impl ParsedApiDescription {
    /// Build a description from a structured document
    ///
    /// The version marker is checked first; a document without `paths` or
    /// schemas yields empty endpoint and model collections.
    ///
    /// # Errors
    /// - [`DocumentError::Format`] when the root is not a mapping
    /// - [`DocumentError::Version`] when the marker does not satisfy `requirement`
    pub fn from_document(document: &Value, requirement: &VersionRequirement) -> Result<Self, DocumentError> {
        if !document.is_object() {
            return Err(DocumentError::format("document root is not a mapping"));
        }
        let spec_version = requirement.check(document)?;

        let info = document.get("info");
        let text = |key: &str| {
            info.and_then(|i| i.get(key))
                .map(scalar_text)
                .unwrap_or_default()
        };

        Ok(Self {
            title: text("title"),
            version: text("version"),
            description: text("description"),
            endpoints: collect_endpoints(document),
            models: collect_models(document),
            spec_version: Some(spec_version),
        })
    }

    /// Number of endpoints
    #[inline]
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Number of models
    #[inline]
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Model names in document order
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Find endpoint by method and path
    #[must_use]
    pub fn find_endpoint(&self, method: &str, path: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.method.eq_ignore_ascii_case(method) && e.path == path)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn collect_endpoints(document: &Value) -> Vec<Endpoint> {
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (key, operation) in item {
            let method = key.to_ascii_lowercase();
            if !OPERATION_METHODS.contains(&method.as_str()) {
                continue;
            }
            let summary = operation
                .get("summary")
                .or_else(|| operation.get("operationId"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            endpoints.push(Endpoint::new(method, path.clone(), summary));
        }
    }
    endpoints
}

fn collect_models(document: &Value) -> IndexMap<String, ModelDescription> {
    let schemas = document
        .get("components")
        .and_then(|c| c.get("schemas"))
        .or_else(|| document.get("definitions"))
        .and_then(Value::as_object);

    schemas
        .map(|schemas| {
            schemas
                .iter()
                .map(|(name, schema)| {
                    let model = ModelDescription {
                        description: schema
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        properties: schema
                            .get("properties")
                            .and_then(Value::as_object)
                            .map(|props| props.keys().cloned().collect())
                            .unwrap_or_default(),
                    };
                    (name.clone(), model)
                })
                .collect()
        })
        .unwrap_or_default()
}
