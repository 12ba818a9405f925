//! Wire types exchanged with the backend

use crate::error::{BackendError, BackendResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Server-side lifecycle status of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Stored, not yet parsed
    #[default]
    Uploaded,
    /// Parse in progress
    Parsing,
    /// Parsed into an API description
    Parsed,
    /// Test-case generation in progress
    Generating,
    /// Test execution in progress
    Executing,
    /// Result analysis in progress
    Analyzing,
    /// Pipeline finished
    Completed,
    /// Pipeline failed server-side
    Failed,
}

impl DocumentStatus {
    /// Whether a stage request is outstanding
    #[inline]
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::Parsing | Self::Generating | Self::Executing | Self::Analyzing
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uploaded => "uploaded",
            Self::Parsing => "parsing",
            Self::Parsed => "parsed",
            Self::Generating => "generating",
            Self::Executing => "executing",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A document known to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier assigned on upload
    #[serde(alias = "document_id", alias = "file_id")]
    pub id: String,
    /// Display name
    #[serde(alias = "filename", alias = "file_name")]
    pub name: String,
    /// Size in bytes
    #[serde(default, alias = "file_size")]
    pub size: u64,
    /// Upload timestamp
    #[serde(default, alias = "upload_time")]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Lifecycle status
    #[serde(default)]
    pub status: DocumentStatus,
}

/// A local file staged for upload
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent with the multipart part
    pub name: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    /// Create from name and content
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk
    ///
    /// # Errors
    /// [`BackendError::Io`] when the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> BackendResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| BackendError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// Lower-cased extension, without the dot
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the file is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type announced for the upload part
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("json") => "application/json",
            Some("yaml" | "yml") => "application/x-yaml",
            _ => "application/octet-stream",
        }
    }
}

/// Server acknowledgement of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Assigned identifier
    #[serde(alias = "id", alias = "file_id")]
    pub document_id: String,
    /// Stored name, if the server renamed the file
    #[serde(default, alias = "filename")]
    pub name: Option<String>,
    /// Stored size
    #[serde(default)]
    pub size: Option<u64>,
    /// Server timestamp
    #[serde(default, alias = "upload_time")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Downstream stage triggered against an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageRequest {
    /// Generate test cases from the parsed description
    GenerateTestCases,
    /// Execute generated tests
    ExecuteTests,
    /// Analyze execution results
    AnalyzeResults,
    /// Run generation and execution in one call
    FullWorkflow,
}

impl StageRequest {
    /// All stage requests in pipeline order
    pub const ALL: [StageRequest; 4] = [
        Self::GenerateTestCases,
        Self::ExecuteTests,
        Self::AnalyzeResults,
        Self::FullWorkflow,
    ];

    /// Path segment under `/api/docs/`
    #[inline]
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::GenerateTestCases => "generate-test-cases",
            Self::ExecuteTests => "execute-tests",
            Self::AnalyzeResults => "analyze-results",
            Self::FullWorkflow => "full-workflow",
        }
    }

    /// Human-readable label
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::GenerateTestCases => "test case generation",
            Self::ExecuteTests => "test execution",
            Self::AnalyzeResults => "result analysis",
            Self::FullWorkflow => "full workflow",
        }
    }
}

impl fmt::Display for StageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Result of a stage trigger or delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Server message
    pub message: Option<String>,
    /// Stage-specific payload, passed through untouched
    pub data: Option<Value>,
}

/// Converted third-party documentation page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirdPartyDocument {
    /// The API description, as a document tree or as raw text
    #[serde(alias = "spec")]
    pub document: Value,
    /// Derived relations between endpoints, best-effort
    #[serde(default)]
    pub relations: Option<Value>,
    /// Derived test scenarios, best-effort
    #[serde(default)]
    pub scenarios: Option<Value>,
}

/// A directly fetched external resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if any
    pub content_type: Option<String>,
    /// Body as text
    pub body: String,
}

impl FetchedResource {
    /// Whether the status is 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
