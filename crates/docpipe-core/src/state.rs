//! Session state owned by the workflow
//!
//! Plain data plus the transitions the workflow applies to it. Locking is
//! the owner's concern; nothing here is async.

use crate::stage::WorkflowStage;
use docpipe_client::{Document, DocumentStatus};
use docpipe_openapi::ParsedApiDescription;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Where the current description came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParsedSource {
    /// Server-side parse of an uploaded document
    Document(String),
    /// Local parse of pasted text
    RawText,
    /// Local parse of a fetched URL
    Url(String),
}

/// Supplementary data returned by third-party extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedData {
    /// Relations between endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Value>,
    /// Suggested test scenarios
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Value>,
}

impl DerivedData {
    /// Keep only payloads that are present and non-null
    #[must_use]
    pub fn from_parts(relations: Option<Value>, scenarios: Option<Value>) -> Option<Self> {
        let relations = relations.filter(|v| !v.is_null());
        let scenarios = scenarios.filter(|v| !v.is_null());
        (relations.is_some() || scenarios.is_some()).then_some(Self { relations, scenarios })
    }
}

/// Stage reached by one document and how it got there
#[derive(Debug, Clone, PartialEq, Eq)]
struct StageTrack {
    current: WorkflowStage,
    history: Vec<WorkflowStage>,
}

impl StageTrack {
    fn starting_at(stage: WorkflowStage) -> Self {
        Self {
            current: stage,
            history: vec![stage],
        }
    }
}

/// Documents, stages, current description and outstanding requests
#[derive(Debug, Default)]
pub struct WorkflowState {
    documents: Vec<Document>,
    stages: HashMap<String, StageTrack>,
    current: Option<(ParsedSource, ParsedApiDescription)>,
    derived: Option<DerivedData>,
    generation: u64,
    in_flight: HashSet<String>,
}

impl WorkflowState {
    /// Create empty state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents in list order
    #[inline]
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Look up a document
    #[must_use]
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Append a freshly uploaded document at stage `uploaded`
    ///
    /// A document with the same id is replaced in place.
    pub fn add_document(&mut self, document: Document) {
        self.stages
            .insert(document.id.clone(), StageTrack::starting_at(WorkflowStage::Uploaded));
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    /// Replace the list wholesale
    ///
    /// Stage tracks survive for documents still present; new documents are
    /// seeded from their server status; tracks for vanished documents go.
    ///
    /// A document with a request in flight keeps its local in-progress status.
    pub fn replace_documents(&mut self, mut documents: Vec<Document>) {
        for doc in &mut documents {
            if !self.in_flight.contains(&doc.id) {
                continue;
            }
            if let Some(local) = self.status(&doc.id).filter(|s| s.is_in_progress()) {
                doc.status = local;
            }
        }
        let ids: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        self.stages.retain(|id, _| ids.contains(id.as_str()));
        for doc in &documents {
            self.stages
                .entry(doc.id.clone())
                .or_insert_with(|| StageTrack::starting_at(WorkflowStage::from_status(doc.status)));
        }
        self.documents = documents;
    }

    /// Remove a document and its stage track
    pub fn remove_document(&mut self, id: &str) -> Option<Document> {
        self.stages.remove(id);
        let index = self.documents.iter().position(|d| d.id == id)?;
        Some(self.documents.remove(index))
    }

    /// Displayed status of a document
    #[must_use]
    pub fn status(&self, id: &str) -> Option<DocumentStatus> {
        self.document(id).map(|d| d.status)
    }

    /// Set the displayed status, returning the previous one
    pub fn set_status(&mut self, id: &str, status: DocumentStatus) -> Option<DocumentStatus> {
        let doc = self.documents.iter_mut().find(|d| d.id == id)?;
        Some(std::mem::replace(&mut doc.status, status))
    }

    /// Stage reached by a document
    #[must_use]
    pub fn stage(&self, id: &str) -> Option<WorkflowStage> {
        self.stages.get(id).map(|t| t.current)
    }

    /// Stages recorded for a document, oldest first
    #[must_use]
    pub fn stage_history(&self, id: &str) -> Vec<WorkflowStage> {
        self.stages.get(id).map(|t| t.history.clone()).unwrap_or_default()
    }

    /// Record that `stage` was reached
    ///
    /// Only forward moves are recorded; returns whether the stage advanced.
    /// Documents not yet tracked start from `uploaded`.
    pub fn advance(&mut self, id: &str, stage: WorkflowStage) -> bool {
        let track = self
            .stages
            .entry(id.to_string())
            .or_insert_with(|| StageTrack::starting_at(WorkflowStage::Uploaded));
        if stage.rank() <= track.current.rank() {
            return false;
        }
        track.current = stage;
        track.history.push(stage);
        true
    }

    /// Current parsed description
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&ParsedApiDescription> {
        self.current.as_ref().map(|(_, desc)| desc)
    }

    /// Source of the current description
    #[inline]
    #[must_use]
    pub fn current_source(&self) -> Option<&ParsedSource> {
        self.current.as_ref().map(|(source, _)| source)
    }

    /// Derived data kept alongside the current description
    #[inline]
    #[must_use]
    pub fn derived(&self) -> Option<&DerivedData> {
        self.derived.as_ref()
    }

    /// Replace the current description wholesale
    ///
    /// Returns the generation of the new description; each call yields a
    /// larger one than the last.
    pub fn set_current(
        &mut self,
        source: ParsedSource,
        description: ParsedApiDescription,
        derived: Option<DerivedData>,
    ) -> u64 {
        self.current = Some((source, description));
        self.derived = derived;
        self.generation += 1;
        self.generation
    }

    /// Claim the in-flight slot for a document
    ///
    /// Returns `false` if a request is already outstanding.
    pub fn begin_request(&mut self, id: &str) -> bool {
        self.in_flight.insert(id.to_string())
    }

    /// Release the in-flight slot
    pub fn finish_request(&mut self, id: &str) {
        self.in_flight.remove(id);
    }

    /// Whether a request for the document is outstanding
    #[inline]
    #[must_use]
    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc(id: &str, status: DocumentStatus) -> Document {
        Document {
            id: id.to_string(),
            name: format!("{id}.yaml"),
            size: 10,
            uploaded_at: None,
            status,
        }
    }

    #[test]
    fn add_then_remove() {
        let mut state = WorkflowState::new();
        state.add_document(doc("a", DocumentStatus::Uploaded));
        state.add_document(doc("b", DocumentStatus::Uploaded));
        state.add_document(doc("a", DocumentStatus::Uploaded));

        assert_eq!(state.documents().len(), 2);
        assert_eq!(state.stage("a"), Some(WorkflowStage::Uploaded));

        assert!(state.remove_document("a").is_some());
        assert!(state.remove_document("a").is_none());
        assert_eq!(state.stage("a"), None);
        assert_eq!(state.documents()[0].id, "b");
    }

    #[test]
    fn replace_is_wholesale_and_seeds_stages() {
        let mut state = WorkflowState::new();
        state.add_document(doc("kept", DocumentStatus::Uploaded));
        state.advance("kept", WorkflowStage::Parsed);
        state.add_document(doc("gone", DocumentStatus::Uploaded));

        state.replace_documents(vec![
            doc("kept", DocumentStatus::Parsed),
            doc("new", DocumentStatus::Completed),
        ]);

        let ids: Vec<_> = state.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["kept", "new"]);
        assert_eq!(
            state.stage_history("kept"),
            vec![WorkflowStage::Uploaded, WorkflowStage::Parsed]
        );
        assert_eq!(state.stage("new"), Some(WorkflowStage::ResultsAnalyzed));
        assert_eq!(state.stage("gone"), None);
    }

    #[test]
    fn status_round_trip() {
        let mut state = WorkflowState::new();
        state.add_document(doc("a", DocumentStatus::Parsed));
        assert_eq!(state.set_status("a", DocumentStatus::Generating), Some(DocumentStatus::Parsed));
        assert_eq!(state.status("a"), Some(DocumentStatus::Generating));
        assert_eq!(state.set_status("missing", DocumentStatus::Parsed), None);
    }

    #[test]
    fn full_workflow_skips_ahead() {
        let mut state = WorkflowState::new();
        assert!(state.advance("x", WorkflowStage::FullWorkflowComplete));
        assert!(!state.advance("x", WorkflowStage::TestsExecuted));
        assert!(state.advance("x", WorkflowStage::ResultsAnalyzed));
        assert_eq!(
            state.stage_history("x"),
            vec![
                WorkflowStage::Uploaded,
                WorkflowStage::FullWorkflowComplete,
                WorkflowStage::ResultsAnalyzed
            ]
        );
    }

    #[test]
    fn in_flight_slot_is_exclusive() {
        let mut state = WorkflowState::new();
        assert!(state.begin_request("a"));
        assert!(!state.begin_request("a"));
        assert!(state.begin_request("b"));
        state.finish_request("a");
        assert!(!state.is_in_flight("a"));
        assert!(state.is_in_flight("b"));
    }

    #[test]
    fn refresh_keeps_in_progress_status_of_busy_document() {
        let mut state = WorkflowState::new();
        state.add_document(doc("busy", DocumentStatus::Uploaded));
        state.add_document(doc("idle", DocumentStatus::Uploaded));
        assert!(state.begin_request("busy"));
        state.set_status("busy", DocumentStatus::Parsing);

        state.replace_documents(vec![
            doc("busy", DocumentStatus::Uploaded),
            doc("idle", DocumentStatus::Parsed),
        ]);
        assert_eq!(state.status("busy"), Some(DocumentStatus::Parsing));
        assert_eq!(state.status("idle"), Some(DocumentStatus::Parsed));

        state.finish_request("busy");
        state.replace_documents(vec![doc("busy", DocumentStatus::Parsed)]);
        assert_eq!(state.status("busy"), Some(DocumentStatus::Parsed));
    }

    #[test]
    fn derived_data_drops_nulls() {
        assert_eq!(DerivedData::from_parts(None, Some(Value::Null)), None);
        let derived = DerivedData::from_parts(Some(serde_json::json!([1])), None).unwrap();
        assert!(derived.scenarios.is_none());
    }

    fn any_stage() -> impl Strategy<Value = WorkflowStage> {
        prop_oneof![
            Just(WorkflowStage::Uploaded),
            Just(WorkflowStage::Parsed),
            Just(WorkflowStage::TestsGenerated),
            Just(WorkflowStage::TestsExecuted),
            Just(WorkflowStage::ResultsAnalyzed),
            Just(WorkflowStage::FullWorkflowComplete),
        ]
    }

    proptest! {
        #[test]
        fn history_is_strictly_forward(stages in prop::collection::vec(any_stage(), 0..20)) {
            let mut state = WorkflowState::new();
            for stage in &stages {
                state.advance("d", *stage);
            }

            let history = state.stage_history("d");
            prop_assert!(history.windows(2).all(|w| w[0].rank() < w[1].rank()));

            let max_rank = stages.iter().map(|s| s.rank()).max();
            prop_assert_eq!(state.stage("d").map(WorkflowStage::rank), max_rank);
        }
    }
}
