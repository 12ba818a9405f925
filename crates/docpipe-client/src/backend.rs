//! Backend trait
//!
//! Every remote operation the ingestion workflow needs, one method per
//! endpoint. Implementations issue exactly one request per call and never
//! retry.

use crate::error::BackendResult;
use crate::types::{
    Document, FetchedResource, StageOutcome, StageRequest, ThirdPartyDocument, UploadFile,
    UploadReceipt,
};
use async_trait::async_trait;
use docpipe_openapi::ParsedApiDescription;
use reqwest::Url;

/// Remote side of the document ingestion workflow
#[async_trait]
pub trait DocsBackend: Send + Sync + std::fmt::Debug {
    /// `POST /api/docs/upload` (multipart, field `file`)
    async fn upload(&self, file: &UploadFile) -> BackendResult<UploadReceipt>;

    /// `GET /api/docs/list`
    async fn list_documents(&self) -> BackendResult<Vec<Document>>;

    /// `GET /api/docs/uploaded-list`
    async fn list_uploaded(&self) -> BackendResult<Vec<Document>>;

    /// `POST /api/docs/parse/{id}`
    async fn parse(&self, document_id: &str) -> BackendResult<ParsedApiDescription>;

    /// `DELETE /api/docs/delete/{id}`
    async fn delete(&self, document_id: &str) -> BackendResult<StageOutcome>;

    /// `POST /api/docs/{stage}/{id}`
    async fn trigger(&self, stage: StageRequest, document_id: &str) -> BackendResult<StageOutcome>;

    /// `POST /api/docs/fetch-feishu`
    async fn fetch_third_party(&self, url: &Url) -> BackendResult<ThirdPartyDocument>;

    /// Plain `GET` of an arbitrary URL, outside the envelope protocol
    async fn fetch_external(&self, url: &Url) -> BackendResult<FetchedResource>;
}
