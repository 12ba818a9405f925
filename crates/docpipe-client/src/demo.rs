//! Demo / offline fallback
//!
//! Wraps a real backend and substitutes placeholder data when a call fails,
//! so the workflow can be shown without a running server. Enabled only by
//! explicit configuration; the wrapped backend is always tried first.

use crate::backend::DocsBackend;
use crate::error::BackendResult;
use crate::types::{
    Document, DocumentStatus, FetchedResource, StageOutcome, StageRequest, ThirdPartyDocument,
    UploadFile, UploadReceipt,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use docpipe_openapi::{Endpoint, ModelDescription, ParsedApiDescription};
use reqwest::Url;
use std::sync::Arc;
use ulid::Ulid;

/// Backend wrapper that falls back to demo data on failure
#[derive(Debug, Clone)]
pub struct DemoBackend {
    inner: Arc<dyn DocsBackend>,
}

impl DemoBackend {
    /// Wrap `inner`
    #[inline]
    #[must_use]
    pub fn new(inner: Arc<dyn DocsBackend>) -> Self {
        Self { inner }
    }
}

/// Log the substitution and produce the fallback value
fn fallback<T>(operation: &str, result: BackendResult<T>, demo: impl FnOnce() -> T) -> BackendResult<T> {
    result.or_else(|e| {
        tracing::warn!(operation, error = %e, "backend unavailable, serving demo data");
        Ok(demo())
    })
}

#[async_trait]
impl DocsBackend for DemoBackend {
    async fn upload(&self, file: &UploadFile) -> BackendResult<UploadReceipt> {
        let result = self.inner.upload(file).await;
        fallback("upload", result, || UploadReceipt {
            document_id: format!("demo-{}", Ulid::new().to_string().to_lowercase()),
            name: Some(file.name.clone()),
            size: Some(file.len()),
            uploaded_at: Some(Utc::now()),
        })
    }

    async fn list_documents(&self) -> BackendResult<Vec<Document>> {
        let result = self.inner.list_documents().await;
        fallback("list", result, sample_documents)
    }

    async fn list_uploaded(&self) -> BackendResult<Vec<Document>> {
        let result = self.inner.list_uploaded().await;
        fallback("uploaded-list", result, sample_documents)
    }

    async fn parse(&self, document_id: &str) -> BackendResult<ParsedApiDescription> {
        let result = self.inner.parse(document_id).await;
        fallback("parse", result, sample_description)
    }

    async fn delete(&self, document_id: &str) -> BackendResult<StageOutcome> {
        let result = self.inner.delete(document_id).await;
        fallback("delete", result, || demo_outcome("delete"))
    }

    async fn trigger(&self, stage: StageRequest, document_id: &str) -> BackendResult<StageOutcome> {
        let result = self.inner.trigger(stage, document_id).await;
        fallback(stage.path_segment(), result, || demo_outcome(stage.label()))
    }

    async fn fetch_third_party(&self, url: &Url) -> BackendResult<ThirdPartyDocument> {
        // Extraction results depend on the page; there is nothing meaningful to fake
        self.inner.fetch_third_party(url).await
    }

    async fn fetch_external(&self, url: &Url) -> BackendResult<FetchedResource> {
        self.inner.fetch_external(url).await
    }
}

fn demo_outcome(what: &str) -> StageOutcome {
    StageOutcome {
        message: Some(format!("demo mode: {what} simulated")),
        data: None,
    }
}

/// Placeholder document list
#[must_use]
pub fn sample_documents() -> Vec<Document> {
    let now = Utc::now();
    vec![
        Document {
            id: "demo-petstore".to_string(),
            name: "petstore.yaml".to_string(),
            size: 4_812,
            uploaded_at: Some(now - Duration::days(2)),
            status: DocumentStatus::Completed,
        },
        Document {
            id: "demo-users".to_string(),
            name: "user-service.json".to_string(),
            size: 2_304,
            uploaded_at: Some(now - Duration::hours(5)),
            status: DocumentStatus::Parsed,
        },
        Document {
            id: "demo-orders".to_string(),
            name: "orders.yml".to_string(),
            size: 1_156,
            uploaded_at: Some(now - Duration::minutes(20)),
            status: DocumentStatus::Uploaded,
        },
    ]
}

/// Placeholder parsed description
#[must_use]
pub fn sample_description() -> ParsedApiDescription {
    let mut desc = ParsedApiDescription {
        title: "Demo Pet Store".to_string(),
        version: "1.0.0".to_string(),
        description: "Placeholder description served in demo mode".to_string(),
        endpoints: vec![
            Endpoint::new("get", "/pets", "List pets"),
            Endpoint::new("post", "/pets", "Create a pet"),
            Endpoint::new("get", "/pets/{petId}", "Get a pet by id"),
        ],
        spec_version: Some("3.0.1".to_string()),
        ..ParsedApiDescription::default()
    };
    desc.models.insert(
        "Pet".to_string(),
        ModelDescription {
            description: Some("A pet in the store".to_string()),
            properties: vec!["id".to_string(), "name".to_string(), "tag".to_string()],
        },
    );
    desc.models.insert(
        "Error".to_string(),
        ModelDescription {
            description: None,
            properties: vec!["code".to_string(), "message".to_string()],
        },
    );
    desc
}
