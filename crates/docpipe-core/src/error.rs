//! Error types for the ingestion workflow
//!
//! Every operation fails with a [`WorkflowError`]; [`WorkflowError::kind`]
//! classifies it for callers that only care about the family:
//! - Local rejections (validation, format, version, cancelled, in flight)
//!   are raised before any request is sent
//! - Stage failures wrap the [`BackendError`] of the single request made

use docpipe_client::BackendError;
use docpipe_openapi::DocumentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a workflow failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected locally
    Validation,
    /// Text is not a structured document
    Format,
    /// Version marker unsupported or missing
    Version,
    /// Upload request failed
    Upload,
    /// Parse stage failed
    Parse,
    /// Test-case generation failed
    Generation,
    /// Test execution (or the combined workflow) failed
    Execution,
    /// Result analysis failed
    Analysis,
    /// URL could not be fetched
    Fetch,
    /// Delete request failed
    Delete,
    /// Listing failed
    List,
    /// User declined a confirmation
    Cancelled,
    /// Another request for the document is outstanding
    RequestInFlight,
}

impl ErrorKind {
    /// Stable name, e.g. `ValidationError`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Validation => "ValidationError",
            Self::Format => "FormatError",
            Self::Version => "VersionError",
            Self::Upload => "UploadError",
            Self::Parse => "ParseError",
            Self::Generation => "GenerationError",
            Self::Execution => "ExecutionError",
            Self::Analysis => "AnalysisError",
            Self::Fetch => "FetchError",
            Self::Delete => "DeleteError",
            Self::List => "ListError",
            Self::Cancelled => "Cancelled",
            Self::RequestInFlight => "RequestInFlight",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Workflow operation errors
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Input rejected before any request
    #[error("{0}")]
    Validation(String),

    /// Client-side document parsing failed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Upload request failed
    #[error("upload failed: {}", .0.user_message())]
    Upload(#[source] BackendError),

    /// Parse stage failed
    #[error("parse failed: {}", .0.user_message())]
    Parse(#[source] BackendError),

    /// Test-case generation failed
    #[error("test case generation failed: {}", .0.user_message())]
    Generation(#[source] BackendError),

    /// Test execution failed
    #[error("test execution failed: {}", .0.user_message())]
    Execution(#[source] BackendError),

    /// Combined workflow failed
    #[error("full workflow failed: {}", .0.user_message())]
    FullWorkflow(#[source] BackendError),

    /// Result analysis failed
    #[error("result analysis failed: {}", .0.user_message())]
    Analysis(#[source] BackendError),

    /// URL could not be fetched
    #[error("could not fetch {url}: {reason}")]
    Fetch {
        /// Requested URL
        url: String,
        /// Failure description
        reason: String,
    },

    /// Delete request failed
    #[error("delete failed: {}", .0.user_message())]
    Delete(#[source] BackendError),

    /// Listing failed
    #[error("could not list documents: {}", .0.user_message())]
    List(#[source] BackendError),

    /// User declined the confirmation
    #[error("cancelled")]
    Cancelled,

    /// Another request for the document is outstanding
    #[error("a request for document {0} is already in progress")]
    RequestInFlight(String),
}

impl WorkflowError {
    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Failure classification
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Document(DocumentError::InvalidRequirement(_)) => ErrorKind::Validation,
            Self::Document(DocumentError::Format(_)) => ErrorKind::Format,
            Self::Document(DocumentError::Version { .. }) => ErrorKind::Version,
            Self::Upload(_) => ErrorKind::Upload,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Execution(_) | Self::FullWorkflow(_) => ErrorKind::Execution,
            Self::Analysis(_) => ErrorKind::Analysis,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Delete(_) => ErrorKind::Delete,
            Self::List(_) => ErrorKind::List,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::RequestInFlight(_) => ErrorKind::RequestInFlight,
        }
    }

    /// Underlying backend error, for stage failures
    #[must_use]
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Upload(e)
            | Self::Parse(e)
            | Self::Generation(e)
            | Self::Execution(e)
            | Self::FullWorkflow(e)
            | Self::Analysis(e)
            | Self::Delete(e)
            | Self::List(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure was raised locally, before any request
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation
                | ErrorKind::Format
                | ErrorKind::Version
                | ErrorKind::Cancelled
                | ErrorKind::RequestInFlight
        )
    }
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Snapshot persistence errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// File could not be read or written
    #[error("snapshot io error at {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File content is not a snapshot
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
