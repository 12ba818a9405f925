//! docpipe backend client
//!
//! The request/response boundary between the ingestion workflow and the
//! API-testing backend.
//!
//! # Layers
//!
//! ```text
//! IngestionWorkflow ─→ dyn DocsBackend ─┬─→ HttpBackend (reqwest) ─→ /api/docs/*
//!                                       └─→ DemoBackend ─→ HttpBackend, demo data on failure
//! ```
//!
//! Every endpoint answers with an [`ApiEnvelope`]; [`HttpBackend::call`] is
//! the single place that interprets it.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod demo;
pub mod envelope;
pub mod error;
pub mod http;
pub mod types;

pub use backend::DocsBackend;
pub use demo::DemoBackend;
pub use envelope::ApiEnvelope;
pub use error::{BackendError, BackendResult};
pub use http::HttpBackend;
pub use reqwest::Url;
pub use types::{
    Document, DocumentStatus, FetchedResource, StageOutcome, StageRequest, ThirdPartyDocument,
    UploadFile, UploadReceipt,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
