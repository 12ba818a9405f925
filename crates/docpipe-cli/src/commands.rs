//! Subcommand execution

use crate::confirm::StdinConfirmer;
use crate::output::{PipelineReport, Printer, StageReport};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use docpipe_core::{AutoConfirm, IngestionWorkflow, WorkflowConfig, WorkflowStage};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "docpipe.toml";

/// Snapshot location when the config does not name one
const DEFAULT_SNAPSHOT_PATH: &str = ".docpipe/last-parsed.json";

/// Resolve configuration: file, then environment, then flags
pub(crate) fn load_config(matches: &ArgMatches) -> Result<WorkflowConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => WorkflowConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => WorkflowConfig::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("loading {DEFAULT_CONFIG_FILE}"))?,
        None => WorkflowConfig::default(),
    };
    let mut config = config.apply_env();

    if let Some(url) = matches.get_one::<String>("base-url") {
        config.base_url.clone_from(url);
    }
    if matches.get_flag("demo") {
        config.demo_mode = true;
    }
    if config.snapshot_path.is_none() {
        config.snapshot_path = Some(PathBuf::from(DEFAULT_SNAPSHOT_PATH));
    }

    config.validate()?;
    Ok(config)
}

fn id_arg(args: &ArgMatches) -> Result<&str> {
    args.get_one::<String>("id")
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing document id"))
}

fn file_arg(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("file")
        .ok_or_else(|| anyhow!("missing file argument"))
}

/// Pull the server's view of the documents so stage ordering can be checked
async fn seed_from_server(workflow: &IngestionWorkflow) {
    if workflow.config().enforce_stage_order {
        if let Err(e) = workflow.list_uploaded_documents().await {
            tracing::warn!(error = %e, "could not load document list; stage order unknown");
        }
    }
}

/// Run the selected subcommand
pub(crate) async fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let printer = Printer::new(matches.get_flag("json"));
    let workflow = IngestionWorkflow::new(config)?;

    let Some((name, args)) = matches.subcommand() else {
        return Err(anyhow!("no subcommand given"));
    };

    match name {
        "upload" => {
            let id = workflow.upload_path(file_arg(args)?).await?;
            printer.document_id(&id)
        }
        "list" => {
            let documents = if args.get_flag("all") {
                workflow.list_documents().await?
            } else {
                workflow.list_uploaded_documents().await?
            };
            printer.documents(&documents)
        }
        "parse" => {
            let id = id_arg(args)?;
            seed_from_server(&workflow).await;
            let description = workflow.parse(id).await?;
            printer.description(&description)
        }
        "parse-file" => {
            let path = file_arg(args)?;
            let text = read_source(path).await?;
            let description = workflow.parse_raw_text(&text).await?;
            printer.description(&description)
        }
        "parse-url" => {
            let url = args
                .get_one::<String>("url")
                .ok_or_else(|| anyhow!("missing url"))?;
            let description = workflow.parse_from_url(url).await?;
            printer.description(&description)
        }
        "generate" | "execute" | "analyze" | "full" => {
            let id = id_arg(args)?;
            seed_from_server(&workflow).await;
            let (stage, outcome) = match name {
                "generate" => (WorkflowStage::TestsGenerated, workflow.generate_test_cases(id).await?),
                "execute" => (WorkflowStage::TestsExecuted, workflow.execute_tests(id).await?),
                "analyze" => (WorkflowStage::ResultsAnalyzed, workflow.analyze_results(id).await?),
                _ => (WorkflowStage::FullWorkflowComplete, workflow.run_full_workflow(id).await?),
            };
            printer.outcome(stage.as_str(), &outcome)
        }
        "delete" => {
            let id = id_arg(args)?;
            let workflow = if args.get_flag("yes") {
                workflow.with_confirmer(Arc::new(AutoConfirm::approve()))
            } else {
                workflow.with_confirmer(Arc::new(StdinConfirmer))
            };
            if let Err(e) = workflow.list_uploaded_documents().await {
                tracing::debug!(error = %e, "document name unavailable for prompt");
            }
            let outcome = workflow.delete_document(id).await?;
            printer.outcome("delete", &outcome)
        }
        "pipeline" => {
            let report = run_pipeline(&workflow, file_arg(args)?, args.get_flag("full")).await?;
            printer.pipeline(&report)
        }
        "show" => {
            let store = workflow
                .snapshot_store()
                .ok_or_else(|| anyhow!("no snapshot path configured"))?;
            let snapshot = store
                .load()
                .await?
                .ok_or_else(|| anyhow!("nothing parsed yet ({} does not exist)", store.path().display()))?;
            printer.snapshot(&snapshot)
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

/// Upload, parse, then every downstream stage; stops at the first failure
async fn run_pipeline(workflow: &IngestionWorkflow, path: &Path, combined: bool) -> Result<PipelineReport> {
    let id = workflow.upload_path(path).await?;
    let description = workflow.parse(&id).await?;

    let stages: &[WorkflowStage] = if combined {
        &[WorkflowStage::FullWorkflowComplete, WorkflowStage::ResultsAnalyzed]
    } else {
        &[
            WorkflowStage::TestsGenerated,
            WorkflowStage::TestsExecuted,
            WorkflowStage::ResultsAnalyzed,
        ]
    };

    let mut reports = Vec::with_capacity(stages.len());
    for &stage in stages {
        let outcome = match stage {
            WorkflowStage::TestsGenerated => workflow.generate_test_cases(&id).await?,
            WorkflowStage::TestsExecuted => workflow.execute_tests(&id).await?,
            WorkflowStage::ResultsAnalyzed => workflow.analyze_results(&id).await?,
            _ => workflow.run_full_workflow(&id).await?,
        };
        reports.push(StageReport {
            stage,
            message: outcome.message,
        });
    }

    Ok(PipelineReport {
        document_id: id,
        title: description.title.clone(),
        endpoints: description.endpoint_count(),
        models: description.model_count(),
        stages: reports,
    })
}

/// Read a local file, or stdin for `-`
async fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return tokio::task::spawn_blocking(|| {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).map(|_| text)
        })
        .await?
        .context("reading stdin");
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    fn matches(args: &[&str]) -> ArgMatches {
        cli::build().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docpipe.toml");
        std::fs::write(
            &path,
            "base_url = \"http://from-file:1\"\nsnapshot_path = \"/tmp/snap.json\"\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let config = load_config(&matches(&["docpipe", "--config", path, "list"])).unwrap();
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/snap.json")));
        assert!(!config.demo_mode);

        let config = load_config(&matches(&[
            "docpipe", "--config", path, "--base-url", "http://flag:2", "--demo", "list",
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://flag:2");
        assert!(config.demo_mode);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = load_config(&matches(&["docpipe", "--base-url", "nope", "list"])).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[tokio::test]
    async fn read_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("absent.yaml")).await.unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }
}
