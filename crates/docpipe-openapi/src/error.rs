//! Error types for document parsing
//!
//! Two failure families matter to callers:
//! - Format: the text is not a structured document at all
//! - Version: the text is a document, but its version marker is unsupported

/// Errors produced while turning raw text into an API description
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    /// Neither structured-data nor markup parsing produced a document
    #[error("unrecognised document format: {0}")]
    Format(String),

    /// Version marker missing or not matching the required major.minor
    #[error("unsupported specification version '{found}' (required {required}.x)")]
    Version {
        /// Marker found in the document (`none` when absent)
        found: String,
        /// Required major.minor prefix
        required: String,
    },

    /// The configured requirement itself is malformed
    #[error("invalid version requirement: '{0}'")]
    InvalidRequirement(String),
}

impl DocumentError {
    /// Create format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Create version error
    pub fn version(found: impl Into<String>, required: impl Into<String>) -> Self {
        Self::Version {
            found: found.into(),
            required: required.into(),
        }
    }

    /// Whether this is a version mismatch rather than a format failure
    #[inline]
    #[must_use]
    pub fn is_version(&self) -> bool {
        matches!(self, Self::Version { .. })
    }
}

/// Result type alias for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;
