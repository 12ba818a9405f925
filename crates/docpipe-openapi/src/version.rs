//! Specification version marker checks

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Top-level keys that carry the version marker, in lookup order
const MARKER_KEYS: &[&str] = &["openapi", "swagger"];

/// Required `major.minor` prefix for a document's version marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRequirement {
    major: u32,
    minor: u32,
}

impl VersionRequirement {
    /// Create requirement from components
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Check a marker string such as `3.0.1`
    ///
    /// `3.0` and `3.0.x` match a `3.0` requirement; `3.1.0` and `3` do not.
    #[must_use]
    pub fn matches(&self, marker: &str) -> bool {
        let mut parts = marker.trim().split('.');
        let major = parts.next().and_then(|p| p.parse::<u32>().ok());
        let minor = parts.next().and_then(|p| p.parse::<u32>().ok());
        major == Some(self.major) && minor == Some(self.minor)
    }

    /// Verify the marker of a parsed document, returning it on success
    ///
    /// # Errors
    /// [`DocumentError::Version`] when the marker is absent or mismatched.
    pub fn check(&self, document: &Value) -> Result<String, DocumentError> {
        match version_marker(document) {
            Some(marker) if self.matches(&marker) => Ok(marker),
            Some(marker) => Err(DocumentError::version(marker, self.to_string())),
            None => Err(DocumentError::version("none", self.to_string())),
        }
    }
}

impl Default for VersionRequirement {
    fn default() -> Self {
        Self::new(3, 0)
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionRequirement {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| DocumentError::InvalidRequirement(s.to_string()))?;
        let major = major
            .parse()
            .map_err(|_| DocumentError::InvalidRequirement(s.to_string()))?;
        let minor = minor
            .parse()
            .map_err(|_| DocumentError::InvalidRequirement(s.to_string()))?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for VersionRequirement {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionRequirement> for String {
    fn from(value: VersionRequirement) -> Self {
        value.to_string()
    }
}

/// Read the version marker from a document root
///
/// Numeric markers (an unquoted `swagger: 2.0` in YAML) are rendered back to text.
#[must_use]
pub fn version_marker(document: &Value) -> Option<String> {
    MARKER_KEYS.iter().find_map(|key| match document.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_patch_versions() {
        let req = VersionRequirement::default();
        assert!(req.matches("3.0.0"));
        assert!(req.matches("3.0.1"));
        assert!(req.matches("3.0"));
    }

    #[test]
    fn rejects_other_minor_and_bare_major() {
        let req = VersionRequirement::default();
        assert!(!req.matches("3.1.0"));
        assert!(!req.matches("3"));
        assert!(!req.matches("30.0"));
        assert!(!req.matches("2.0"));
        assert!(!req.matches(""));
    }

    #[test]
    fn parse_requirement() {
        let req: VersionRequirement = "3.1".parse().unwrap();
        assert_eq!(req, VersionRequirement::new(3, 1));
        assert_eq!(req.to_string(), "3.1");

        assert!("3".parse::<VersionRequirement>().is_err());
        assert!("x.y".parse::<VersionRequirement>().is_err());
    }

    #[test]
    fn check_reads_swagger_marker() {
        let req = VersionRequirement::new(2, 0);
        assert_eq!(req.check(&json!({"swagger": "2.0"})).unwrap(), "2.0");
        assert_eq!(req.check(&json!({"swagger": 2.0})).unwrap(), "2.0");
    }

    #[test]
    fn check_missing_marker() {
        let err = VersionRequirement::default().check(&json!({"info": {}})).unwrap_err();
        assert_eq!(err, DocumentError::version("none", "3.0"));
    }

    #[test]
    fn requirement_serde_as_string() {
        let req: VersionRequirement = serde_json::from_str("\"3.0\"").unwrap();
        assert_eq!(req, VersionRequirement::default());
        assert_eq!(serde_json::to_string(&req).unwrap(), "\"3.0\"");
    }
}
