//! Result rendering: human-readable text or JSON on stdout

use anyhow::Result;
use docpipe_client::{Document, StageOutcome};
use docpipe_core::{Snapshot, WorkflowStage};
use docpipe_openapi::ParsedApiDescription;
use serde::Serialize;
use std::fmt::Write as _;

/// One stage run by `pipeline`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StageReport {
    pub(crate) stage: WorkflowStage,
    pub(crate) message: Option<String>,
}

/// Summary printed by `pipeline`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PipelineReport {
    pub(crate) document_id: String,
    pub(crate) title: String,
    pub(crate) endpoints: usize,
    pub(crate) models: usize,
    pub(crate) stages: Vec<StageReport>,
}

/// Writes results in the selected format
#[derive(Debug, Clone, Copy)]
pub(crate) struct Printer {
    json: bool,
}

impl Printer {
    pub(crate) fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }

    pub(crate) fn document_id(&self, id: &str) -> Result<()> {
        self.emit(&serde_json::json!({ "document_id": id }), || format!("{id}\n"))
    }

    pub(crate) fn documents(&self, documents: &[Document]) -> Result<()> {
        self.emit(&documents, || render_documents(documents))
    }

    pub(crate) fn description(&self, description: &ParsedApiDescription) -> Result<()> {
        self.emit(description, || render_description(description))
    }

    pub(crate) fn outcome(&self, label: &str, outcome: &StageOutcome) -> Result<()> {
        self.emit(outcome, || {
            let message = outcome.message.clone().unwrap_or_else(|| format!("{label} finished"));
            format!("{message}\n")
        })
    }

    pub(crate) fn snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.emit(snapshot, || {
            format!(
                "saved {}\n{}",
                snapshot.saved_at.to_rfc3339(),
                render_description(&snapshot.description)
            )
        })
    }

    pub(crate) fn pipeline(&self, report: &PipelineReport) -> Result<()> {
        self.emit(report, || {
            let mut out = format!(
                "{} ({}): {} endpoints, {} models\n",
                report.title, report.document_id, report.endpoints, report.models
            );
            for stage in &report.stages {
                let _ = writeln!(out, "  {:<24} {}", stage.stage, stage.message.as_deref().unwrap_or("ok"));
            }
            out
        })
    }
}

pub(crate) fn render_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "no documents\n".to_string();
    }
    let mut out = String::new();
    for doc in documents {
        let uploaded = doc
            .uploaded_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<28} {:<32} {:>10} {:<16} {}",
            doc.id, doc.name, doc.size, uploaded, doc.status
        );
    }
    out
}

pub(crate) fn render_description(description: &ParsedApiDescription) -> String {
    let mut out = format!("{} {}", description.title, description.version);
    if let Some(marker) = &description.spec_version {
        let _ = write!(out, " (openapi {marker})");
    }
    out.push('\n');
    if !description.description.is_empty() {
        let _ = writeln!(out, "  {}", description.description);
    }

    let _ = writeln!(out, "Endpoints ({}):", description.endpoint_count());
    for endpoint in &description.endpoints {
        let _ = writeln!(out, "  {:<7} {:<32} {}", endpoint.method, endpoint.path, endpoint.summary);
    }

    let _ = writeln!(out, "Models ({}):", description.model_count());
    for (name, model) in &description.models {
        let _ = writeln!(out, "  {name}: {}", model.properties.join(", "));
    }
    out
}
