//! reqwest-backed implementation of [`DocsBackend`]

use crate::backend::DocsBackend;
use crate::envelope::{self, ApiEnvelope};
use crate::error::{BackendError, BackendResult};
use crate::types::{
    Document, FetchedResource, StageOutcome, StageRequest, ThirdPartyDocument, UploadFile,
    UploadReceipt,
};
use async_trait::async_trait;
use docpipe_openapi::ParsedApiDescription;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Path prefix shared by every document endpoint
const DOCS_PREFIX: [&str; 2] = ["api", "docs"];

/// HTTP client for the ingestion backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    http: Client,
}

impl HttpBackend {
    /// Create client for `base_url` with the platform default timeout
    ///
    /// # Errors
    /// [`BackendError::Url`] when `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> BackendResult<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create client with an explicit request timeout
    ///
    /// # Errors
    /// [`BackendError::Url`] for a bad base URL, [`BackendError::Transport`]
    /// if the underlying client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> BackendResult<Self> {
        let base = Url::parse(base_url).map_err(|e| BackendError::Url(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Url(format!("{base_url}: not a base URL")));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base,
            http: builder.build()?,
        })
    }

    /// Base URL every endpoint is resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `/api/docs/<segments...>`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(DOCS_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Issue a request and interpret the response envelope
    ///
    /// Both failure channels are checked: a non-success HTTP status and a
    /// `success: false` body.
    ///
    /// # Errors
    /// Any [`BackendError`] variant except `Io`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> BackendResult<(Option<String>, Option<T>)> {
        let request = request.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "backend request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = envelope::error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::debug!(status = status.as_u16(), %message, "backend returned error status");
            return Err(BackendError::status(status.as_u16(), message));
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;
        envelope.into_result()
    }

    /// [`Self::call`] for endpoints whose payload is mandatory
    async fn call_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> BackendResult<T> {
        let (_, data) = self.call(request).await?;
        data.ok_or(BackendError::MissingData)
    }

    async fn call_outcome(&self, request: RequestBuilder) -> BackendResult<StageOutcome> {
        let (message, data) = self.call::<Value>(request).await?;
        Ok(StageOutcome { message, data })
    }
}

#[async_trait]
impl DocsBackend for HttpBackend {
    async fn upload(&self, file: &UploadFile) -> BackendResult<UploadReceipt> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["upload"])?;
        self.call_data(self.http.post(url).multipart(form)).await
    }

    async fn list_documents(&self) -> BackendResult<Vec<Document>> {
        let url = self.endpoint(&["list"])?;
        let (_, data) = self.call::<Vec<Document>>(self.http.get(url)).await?;
        Ok(data.unwrap_or_default())
    }

    async fn list_uploaded(&self) -> BackendResult<Vec<Document>> {
        let url = self.endpoint(&["uploaded-list"])?;
        let (_, data) = self.call::<Vec<Document>>(self.http.get(url)).await?;
        Ok(data.unwrap_or_default())
    }

    async fn parse(&self, document_id: &str) -> BackendResult<ParsedApiDescription> {
        let url = self.endpoint(&["parse", document_id])?;
        self.call_data(self.http.post(url)).await
    }

    async fn delete(&self, document_id: &str) -> BackendResult<StageOutcome> {
        let url = self.endpoint(&["delete", document_id])?;
        self.call_outcome(self.http.delete(url)).await
    }

    async fn trigger(&self, stage: StageRequest, document_id: &str) -> BackendResult<StageOutcome> {
        let url = self.endpoint(&[stage.path_segment(), document_id])?;
        self.call_outcome(self.http.post(url)).await
    }

    async fn fetch_third_party(&self, url: &Url) -> BackendResult<ThirdPartyDocument> {
        let endpoint = self.endpoint(&["fetch-feishu"])?;
        let body = serde_json::json!({ "url": url.as_str() });
        self.call_data(self.http.post(endpoint).json(&body)).await
    }

    async fn fetch_external(&self, url: &Url) -> BackendResult<FetchedResource> {
        tracing::debug!(%url, "fetching external document");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(FetchedResource {
            status,
            content_type,
            body,
        })
    }
}
