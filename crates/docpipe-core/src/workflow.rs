//! Ingestion workflow
//!
//! Sequences remote calls for one document at a time and mirrors their
//! progress into [`WorkflowState`]:
//! - Each operation issues at most one request and never retries
//! - Local checks (extension, size, URL shape, ordering) run first
//! - Failures are reported to the [`Notifier`] and returned to the caller
//! - State is locked briefly and never across an await

use crate::config::{ConfigError, WorkflowConfig};
use crate::confirm::{AutoConfirm, Confirmer};
use crate::error::{ErrorKind, WorkflowError, WorkflowResult};
use crate::notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::stage::WorkflowStage;
use crate::state::{DerivedData, ParsedSource, WorkflowState};
use chrono::Utc;
use docpipe_client::{
    BackendError, BackendResult, DemoBackend, Document, DocumentStatus, DocsBackend, HttpBackend,
    StageOutcome, StageRequest, UploadFile, Url,
};
use docpipe_openapi::{parse_fetched, ParsedApiDescription};
use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Releases a document's in-flight slot when dropped
struct InFlight<'a> {
    state: &'a Mutex<WorkflowState>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.lock().finish_request(&self.id);
    }
}

/// Client-side orchestrator of the document ingestion workflow
#[derive(Debug)]
pub struct IngestionWorkflow {
    config: WorkflowConfig,
    backend: Arc<dyn DocsBackend>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    snapshots: Option<SnapshotStore>,
    state: Mutex<WorkflowState>,
}

impl IngestionWorkflow {
    /// Create workflow talking HTTP to `config.base_url`
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the configuration does not validate.
    pub fn new(config: WorkflowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = HttpBackend::with_timeout(&config.base_url, config.request_timeout())
            .map_err(|e| ConfigError::invalid(e.to_string()))?;
        Ok(Self::with_backend(config, Arc::new(http)))
    }

    /// Create workflow over an arbitrary backend
    ///
    /// With `demo_mode` set the backend is wrapped in [`DemoBackend`].
    /// Notifications go to `tracing` and confirmations are declined until
    /// replaced with [`Self::with_notifier`] / [`Self::with_confirmer`].
    #[must_use]
    pub fn with_backend(config: WorkflowConfig, backend: Arc<dyn DocsBackend>) -> Self {
        let backend: Arc<dyn DocsBackend> = if config.demo_mode {
            tracing::info!("demo mode enabled: backend failures fall back to sample data");
            Arc::new(DemoBackend::new(backend))
        } else {
            backend
        };

        Self {
            snapshots: config.snapshot_path.clone().map(SnapshotStore::new),
            config,
            backend,
            notifier: Arc::new(TracingNotifier),
            confirmer: Arc::new(AutoConfirm::deny()),
            state: Mutex::new(WorkflowState::new()),
        }
    }

    /// With notification sink
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// With confirmation gate
    #[must_use]
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Upload a document, returning the identifier the backend assigned
    ///
    /// # Errors
    /// - [`ErrorKind::Validation`] for a disallowed extension or oversize file;
    ///   no request is made
    /// - [`ErrorKind::Upload`] if the backend rejects the upload
    pub async fn upload(&self, file: UploadFile) -> WorkflowResult<String> {
        let result = self.upload_inner(file).await;
        self.report(result)
    }

    /// Read a file from disk and [`upload`](Self::upload) it
    ///
    /// # Errors
    /// As [`Self::upload`]; an unreadable file is a validation error.
    pub async fn upload_path(&self, path: impl AsRef<Path>) -> WorkflowResult<String> {
        match UploadFile::from_path(path).await {
            Ok(file) => self.upload(file).await,
            Err(e) => self.report(Err(WorkflowError::validation(e.to_string()))),
        }
    }

    async fn upload_inner(&self, file: UploadFile) -> WorkflowResult<String> {
        self.validate_upload(&file)?;
        tracing::info!(name = %file.name, size = file.len(), "uploading document");

        let receipt = self.backend.upload(&file).await.map_err(WorkflowError::Upload)?;
        let document = Document {
            id: receipt.document_id.clone(),
            name: receipt.name.unwrap_or_else(|| file.name.clone()),
            size: receipt.size.unwrap_or_else(|| file.len()),
            uploaded_at: receipt.uploaded_at.or_else(|| Some(Utc::now())),
            status: DocumentStatus::Uploaded,
        };

        let message = format!("Uploaded {}", document.name);
        self.state.lock().add_document(document);
        tracing::info!(document = %receipt.document_id, "document uploaded");
        self.notify(NotificationLevel::Success, message);
        Ok(receipt.document_id)
    }

    fn validate_upload(&self, file: &UploadFile) -> WorkflowResult<()> {
        match file.extension() {
            Some(ext) if self.config.is_allowed_extension(&ext) => {}
            Some(ext) => {
                return Err(WorkflowError::validation(format!(
                    "unsupported file type '.{ext}'; allowed: {}",
                    self.config.allowed_extensions_display()
                )))
            }
            None => {
                return Err(WorkflowError::validation(format!(
                    "'{}' has no file extension; allowed: {}",
                    file.name,
                    self.config.allowed_extensions_display()
                )))
            }
        }

        if file.len() > self.config.max_upload_bytes {
            return Err(WorkflowError::validation(format!(
                "'{}' is {} bytes; the limit is {} bytes",
                file.name,
                file.len(),
                self.config.max_upload_bytes
            )));
        }
        Ok(())
    }

    /// Ask the backend to parse an uploaded document
    ///
    /// On success the result becomes the current description and the
    /// snapshot is rewritten.
    ///
    /// # Errors
    /// [`ErrorKind::Parse`] on backend failure, [`ErrorKind::RequestInFlight`]
    /// if the document is busy.
    pub async fn parse(&self, document_id: &str) -> WorkflowResult<ParsedApiDescription> {
        let result = self.parse_inner(document_id).await;
        self.report(result)
    }

    async fn parse_inner(&self, document_id: &str) -> WorkflowResult<ParsedApiDescription> {
        let description = self
            .run_stage(
                document_id,
                WorkflowStage::Parsed,
                || self.backend.parse(document_id),
                WorkflowError::Parse,
            )
            .await?;

        self.adopt(ParsedSource::Document(document_id.to_string()), &description, None)
            .await;
        Ok(description)
    }

    /// Parse pasted text locally
    ///
    /// # Errors
    /// [`ErrorKind::Format`] if the text is neither JSON nor YAML mapping,
    /// [`ErrorKind::Version`] if the version marker is unsupported.
    pub async fn parse_raw_text(&self, text: &str) -> WorkflowResult<ParsedApiDescription> {
        let result = docpipe_openapi::parse_raw_text(text, &self.config.required_version)
            .map_err(WorkflowError::from);
        if let Ok(description) = &result {
            self.adopt(ParsedSource::RawText, description, None).await;
        }
        self.report(result)
    }

    /// Fetch a document from a URL and parse it locally
    ///
    /// Third-party documentation hosts are converted by the backend; any
    /// other URL is fetched directly.
    ///
    /// # Errors
    /// - [`ErrorKind::Validation`] for a malformed or non-http(s) URL; no
    ///   request is made
    /// - [`ErrorKind::Fetch`] if the fetch fails or returns a non-success status
    /// - [`ErrorKind::Format`] / [`ErrorKind::Version`] as for raw text
    pub async fn parse_from_url(&self, url: &str) -> WorkflowResult<ParsedApiDescription> {
        let result = self.parse_from_url_inner(url).await;
        self.report(result)
    }

    async fn parse_from_url_inner(&self, raw: &str) -> WorkflowResult<ParsedApiDescription> {
        let url = parse_http_url(raw)?;
        let host = url.host_str().unwrap_or_default().to_string();
        let requirement = &self.config.required_version;

        let (description, derived) = if self.config.is_third_party_host(&host) {
            tracing::info!(%url, "delegating third-party document to backend");
            let converted = self
                .backend
                .fetch_third_party(&url)
                .await
                .map_err(|e| WorkflowError::fetch(url.as_str(), e.user_message()))?;

            let description = match &converted.document {
                Value::String(text) => docpipe_openapi::parse_raw_text(text, requirement)?,
                document => ParsedApiDescription::from_document(document, requirement)?,
            };
            (description, DerivedData::from_parts(converted.relations, converted.scenarios))
        } else {
            tracing::info!(%url, "fetching document");
            let resource = self
                .backend
                .fetch_external(&url)
                .await
                .map_err(|e| WorkflowError::fetch(url.as_str(), e.user_message()))?;
            if !resource.is_success() {
                return Err(WorkflowError::fetch(
                    url.as_str(),
                    format!("HTTP {}", resource.status),
                ));
            }
            let description = parse_fetched(&resource.body, resource.content_type.as_deref(), requirement)?;
            (description, None)
        };

        self.adopt(ParsedSource::Url(url.to_string()), &description, derived)
            .await;
        Ok(description)
    }

    /// Trigger test-case generation
    ///
    /// # Errors
    /// [`ErrorKind::Generation`] on backend failure.
    pub async fn generate_test_cases(&self, document_id: &str) -> WorkflowResult<StageOutcome> {
        self.trigger(StageRequest::GenerateTestCases, document_id, WorkflowError::Generation)
            .await
    }

    /// Trigger test execution
    ///
    /// # Errors
    /// [`ErrorKind::Execution`] on backend failure.
    pub async fn execute_tests(&self, document_id: &str) -> WorkflowResult<StageOutcome> {
        self.trigger(StageRequest::ExecuteTests, document_id, WorkflowError::Execution)
            .await
    }

    /// Trigger result analysis
    ///
    /// # Errors
    /// [`ErrorKind::Analysis`] on backend failure.
    pub async fn analyze_results(&self, document_id: &str) -> WorkflowResult<StageOutcome> {
        self.trigger(StageRequest::AnalyzeResults, document_id, WorkflowError::Analysis)
            .await
    }

    /// Trigger generation and execution in one step
    ///
    /// # Errors
    /// [`ErrorKind::Execution`] on backend failure.
    pub async fn run_full_workflow(&self, document_id: &str) -> WorkflowResult<StageOutcome> {
        self.trigger(StageRequest::FullWorkflow, document_id, WorkflowError::FullWorkflow)
            .await
    }

    async fn trigger(
        &self,
        request: StageRequest,
        document_id: &str,
        on_error: fn(BackendError) -> WorkflowError,
    ) -> WorkflowResult<StageOutcome> {
        let result = self
            .run_stage(
                document_id,
                WorkflowStage::from(request),
                || self.backend.trigger(request, document_id),
                on_error,
            )
            .await;

        if let Ok(outcome) = &result {
            let message = outcome
                .message
                .clone()
                .unwrap_or_else(|| format!("{} finished for {document_id}", capitalize(request.label())));
            self.notify(NotificationLevel::Success, message);
        }
        self.report(result)
    }

    /// Delete a document after confirmation
    ///
    /// The local list changes only once the backend acknowledges.
    ///
    /// # Errors
    /// [`ErrorKind::Cancelled`] if the confirmation is declined (no request),
    /// [`ErrorKind::Delete`] on backend failure.
    pub async fn delete_document(&self, document_id: &str) -> WorkflowResult<StageOutcome> {
        let result = self.delete_inner(document_id).await;
        self.report(result)
    }

    async fn delete_inner(&self, document_id: &str) -> WorkflowResult<StageOutcome> {
        let name = self
            .state
            .lock()
            .document(document_id)
            .map_or_else(|| document_id.to_string(), |d| d.name.clone());

        if self.is_in_flight(document_id) {
            return Err(WorkflowError::RequestInFlight(document_id.to_string()));
        }
        let prompt = format!("Delete document '{name}'? This cannot be undone.");
        if !self.confirmer.confirm(&prompt).await {
            tracing::info!(document = document_id, "delete cancelled");
            return Err(WorkflowError::Cancelled);
        }

        let _guard = self.begin(document_id)?;
        let outcome = self
            .backend
            .delete(document_id)
            .await
            .map_err(WorkflowError::Delete)?;

        self.state.lock().remove_document(document_id);
        tracing::info!(document = document_id, "document deleted");
        self.notify(NotificationLevel::Success, format!("Deleted {name}"));
        Ok(outcome)
    }

    /// Refresh the local list from `GET /api/docs/uploaded-list`
    ///
    /// The list is replaced wholesale.
    ///
    /// # Errors
    /// [`ErrorKind::List`] on backend failure; the local list is untouched.
    pub async fn list_uploaded_documents(&self) -> WorkflowResult<Vec<Document>> {
        let result = self
            .backend
            .list_uploaded()
            .await
            .map_err(WorkflowError::List)
            .map(|documents| {
                tracing::debug!(count = documents.len(), "uploaded documents listed");
                self.state.lock().replace_documents(documents.clone());
                documents
            });
        self.report(result)
    }

    /// Fetch the backend's catalogue from `GET /api/docs/list`
    ///
    /// The local list is not touched.
    ///
    /// # Errors
    /// [`ErrorKind::List`] on backend failure.
    pub async fn list_documents(&self) -> WorkflowResult<Vec<Document>> {
        let result = self.backend.list_documents().await.map_err(WorkflowError::List);
        self.report(result)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Local document list
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.state.lock().documents().to_vec()
    }

    /// One document from the local list
    #[must_use]
    pub fn document(&self, document_id: &str) -> Option<Document> {
        self.state.lock().document(document_id).cloned()
    }

    /// Current parsed description
    #[must_use]
    pub fn current(&self) -> Option<ParsedApiDescription> {
        self.state.lock().current().cloned()
    }

    /// Where the current description came from
    #[must_use]
    pub fn current_source(&self) -> Option<ParsedSource> {
        self.state.lock().current_source().cloned()
    }

    /// Derived data from third-party extraction
    #[must_use]
    pub fn derived(&self) -> Option<DerivedData> {
        self.state.lock().derived().cloned()
    }

    /// Stage reached by a document
    #[must_use]
    pub fn stage(&self, document_id: &str) -> Option<WorkflowStage> {
        self.state.lock().stage(document_id)
    }

    /// Stages recorded for a document, oldest first
    #[must_use]
    pub fn stage_history(&self, document_id: &str) -> Vec<WorkflowStage> {
        self.state.lock().stage_history(document_id)
    }

    /// Whether a request for the document is outstanding
    #[must_use]
    pub fn is_in_flight(&self, document_id: &str) -> bool {
        self.state.lock().is_in_flight(document_id)
    }

    /// Snapshot storage, when configured
    #[inline]
    #[must_use]
    pub fn snapshot_store(&self) -> Option<&SnapshotStore> {
        self.snapshots.as_ref()
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn begin(&self, document_id: &str) -> WorkflowResult<InFlight<'_>> {
        if !self.state.lock().begin_request(document_id) {
            return Err(WorkflowError::RequestInFlight(document_id.to_string()));
        }
        Ok(InFlight {
            state: &self.state,
            id: document_id.to_string(),
        })
    }

    fn check_order(&self, document_id: &str, stage: WorkflowStage) -> WorkflowResult<()> {
        let current = self.stage(document_id).unwrap_or(WorkflowStage::Uploaded);
        if stage.is_reachable_from(current) {
            return Ok(());
        }

        let required = stage.prerequisite().unwrap_or(WorkflowStage::Uploaded);
        if self.config.enforce_stage_order {
            return Err(WorkflowError::validation(format!(
                "{stage} requires {required}; document {document_id} is at {current}"
            )));
        }
        tracing::warn!(document = document_id, %stage, %current, %required, "stage requested out of order");
        Ok(())
    }

    /// One stage request: ordering check, in-flight slot, in-progress status,
    /// the call itself, then settle or restore
    async fn run_stage<T, F, Fut>(
        &self,
        document_id: &str,
        stage: WorkflowStage,
        call: F,
        on_error: fn(BackendError) -> WorkflowError,
    ) -> WorkflowResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let _guard = self.begin(document_id)?;
        self.check_order(document_id, stage)?;

        let previous = self
            .state
            .lock()
            .set_status(document_id, stage.in_progress_status());
        tracing::info!(document = document_id, %stage, "stage requested");

        match call().await {
            Ok(value) => {
                let mut state = self.state.lock();
                let previous = previous.unwrap_or_default();
                // A repeated earlier stage must not move the display backwards
                let already_past = state.stage(document_id).is_some_and(|s| s.rank() > stage.rank());
                let settled = if already_past { previous } else { stage.settled_status(previous) };
                state.set_status(document_id, settled);
                state.advance(document_id, stage);
                drop(state);
                tracing::info!(document = document_id, %stage, "stage completed");
                Ok(value)
            }
            Err(e) => {
                if let Some(previous) = previous {
                    self.state.lock().set_status(document_id, previous);
                }
                Err(on_error(e))
            }
        }
    }

    /// Make `description` current and write the snapshot
    async fn adopt(&self, source: ParsedSource, description: &ParsedApiDescription, derived: Option<DerivedData>) {
        let generation = self
            .state
            .lock()
            .set_current(source.clone(), description.clone(), derived.clone());

        self.notify(
            NotificationLevel::Success,
            format!(
                "Parsed {}: {} endpoints, {} models",
                description.title,
                description.endpoint_count(),
                description.model_count()
            ),
        );

        if let Some(store) = &self.snapshots {
            let snapshot = Snapshot::new(source, description.clone(), derived);
            match store.save_generation(generation, &snapshot).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!(generation, "newer snapshot already written"),
                Err(e) => tracing::warn!(error = %e, "could not write snapshot"),
            }
        }
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.notifier
            .notify(Notification::new(level, message, self.config.notification_ttl()));
    }

    /// Surface a failure to the notifier and the log, passing the result through
    fn report<T>(&self, result: WorkflowResult<T>) -> WorkflowResult<T> {
        if let Err(e) = &result {
            let level = if e.kind() == ErrorKind::Cancelled {
                NotificationLevel::Info
            } else {
                tracing::error!(kind = %e.kind(), error = %e, "workflow operation failed");
                NotificationLevel::Error
            };
            self.notify(level, e.to_string());
        }
        result
    }
}

fn parse_http_url(raw: &str) -> WorkflowResult<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| WorkflowError::validation(format!("invalid URL '{trimmed}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WorkflowError::validation(format!(
            "invalid URL '{trimmed}': only http and https are supported"
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(WorkflowError::validation(format!("invalid URL '{trimmed}': missing host")));
    }
    Ok(url)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
