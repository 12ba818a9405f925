//! Per-document workflow stages
//!
//! ```text
//! uploaded → parsed → tests-generated → tests-executed → results-analyzed
//! uploaded ─────────→ full-workflow-complete (rank of tests-executed)
//! ```
//!
//! Stages only move forward. Ordering is by [`WorkflowStage::rank`]; the
//! combined stage shares its rank with `tests-executed`.

use docpipe_client::{DocumentStatus, StageRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage reached by a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStage {
    /// Stored by the backend
    Uploaded,
    /// Parsed into an API description
    Parsed,
    /// Test cases generated
    TestsGenerated,
    /// Tests executed
    TestsExecuted,
    /// Execution results analyzed
    ResultsAnalyzed,
    /// Generation and execution done in one step
    FullWorkflowComplete,
}

impl WorkflowStage {
    /// Position in the forward order
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Uploaded => 0,
            Self::Parsed => 1,
            Self::TestsGenerated => 2,
            Self::TestsExecuted | Self::FullWorkflowComplete => 3,
            Self::ResultsAnalyzed => 4,
        }
    }

    /// Stage that must have been reached before this one is requested
    #[must_use]
    pub fn prerequisite(self) -> Option<Self> {
        match self {
            Self::Uploaded => None,
            Self::Parsed | Self::FullWorkflowComplete => Some(Self::Uploaded),
            Self::TestsGenerated => Some(Self::Parsed),
            Self::TestsExecuted => Some(Self::TestsGenerated),
            Self::ResultsAnalyzed => Some(Self::TestsExecuted),
        }
    }

    /// Whether a document at `current` may request this stage
    #[inline]
    #[must_use]
    pub fn is_reachable_from(self, current: Self) -> bool {
        self.prerequisite().map_or(true, |pre| current.rank() >= pre.rank())
    }

    /// Status shown while the request for this stage is outstanding
    #[must_use]
    pub fn in_progress_status(self) -> DocumentStatus {
        match self {
            Self::Uploaded => DocumentStatus::Uploaded,
            Self::Parsed => DocumentStatus::Parsing,
            Self::TestsGenerated => DocumentStatus::Generating,
            Self::TestsExecuted | Self::FullWorkflowComplete => DocumentStatus::Executing,
            Self::ResultsAnalyzed => DocumentStatus::Analyzing,
        }
    }

    /// Status once this stage has succeeded, given the status before the request
    ///
    /// Generation and execution have no status of their own and settle back
    /// to whatever was shown before.
    #[must_use]
    pub fn settled_status(self, previous: DocumentStatus) -> DocumentStatus {
        match self {
            Self::Uploaded => DocumentStatus::Uploaded,
            Self::Parsed => DocumentStatus::Parsed,
            Self::TestsGenerated | Self::TestsExecuted => previous,
            Self::ResultsAnalyzed | Self::FullWorkflowComplete => DocumentStatus::Completed,
        }
    }

    /// Best estimate of the stage reached, from a server-reported status
    #[must_use]
    pub fn from_status(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Uploaded | DocumentStatus::Parsing | DocumentStatus::Failed => Self::Uploaded,
            DocumentStatus::Parsed | DocumentStatus::Generating => Self::Parsed,
            DocumentStatus::Executing => Self::TestsGenerated,
            DocumentStatus::Analyzing => Self::TestsExecuted,
            DocumentStatus::Completed => Self::ResultsAnalyzed,
        }
    }

    /// Kebab-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Parsed => "parsed",
            Self::TestsGenerated => "tests-generated",
            Self::TestsExecuted => "tests-executed",
            Self::ResultsAnalyzed => "results-analyzed",
            Self::FullWorkflowComplete => "full-workflow-complete",
        }
    }
}

impl From<StageRequest> for WorkflowStage {
    fn from(request: StageRequest) -> Self {
        match request {
            StageRequest::GenerateTestCases => Self::TestsGenerated,
            StageRequest::ExecuteTests => Self::TestsExecuted,
            StageRequest::AnalyzeResults => Self::ResultsAnalyzed,
            StageRequest::FullWorkflow => Self::FullWorkflowComplete,
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
