//! docpipe core
//!
//! Client-side orchestration of the document ingestion workflow: upload,
//! parse, then the downstream test stages, with per-document progress
//! tracking and transient notifications.
//!
//! # Architecture
//!
//! ```text
//! IngestionWorkflow
//!   ├── WorkflowConfig      (TOML + env + CLI overrides)
//!   ├── dyn DocsBackend     (HTTP, optionally wrapped for demo mode)
//!   ├── WorkflowState       (documents, stages, current description, in-flight set)
//!   ├── dyn Notifier        (transient messages)
//!   ├── dyn Confirmer       (gate for deletes)
//!   └── SnapshotStore       (last parsed description, JSON file)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use docpipe_core::prelude::*;
//!
//! let workflow = IngestionWorkflow::new(WorkflowConfig::default())?;
//! let id = workflow.upload_path("spec.yaml").await?;
//! let description = workflow.parse(&id).await?;
//! workflow.generate_test_cases(&id).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod confirm;
pub mod error;
pub mod notify;
pub mod snapshot;
pub mod stage;
pub mod state;
pub mod workflow;

pub use config::{ConfigError, WorkflowConfig};
pub use confirm::{AutoConfirm, Confirmer};
pub use error::{ErrorKind, SnapshotError, WorkflowError, WorkflowResult};
pub use notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use snapshot::{Snapshot, SnapshotStore};
pub use stage::WorkflowStage;
pub use state::{DerivedData, ParsedSource, WorkflowState};
pub use workflow::IngestionWorkflow;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the workflow
    pub use crate::{
        ErrorKind, IngestionWorkflow, Notifier, WorkflowConfig, WorkflowError, WorkflowResult,
        WorkflowStage,
    };
    pub use docpipe_client::{Document, DocumentStatus, UploadFile};
    pub use docpipe_openapi::ParsedApiDescription;
}
