//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn document_id() -> Arg {
    Arg::new("id")
        .required(true)
        .value_name("DOCUMENT_ID")
        .help("Identifier assigned by the backend on upload")
}

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("OpenAPI document (.json, .yaml or .yml)")
}

fn stage_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).arg(document_id())
}

/// Build the `docpipe` command
pub(crate) fn build() -> Command {
    Command::new("docpipe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload, parse and test API description documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file (default: ./docpipe.toml if present)"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .value_name("URL")
                .help("Backend base URL, overrides config and DOCPIPE_BASE_URL"),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Fall back to sample data when the backend is unavailable"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs to stderr as JSON lines"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log debug output to stderr"),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a document")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List uploaded documents")
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("List the backend's full catalogue instead"),
                ),
        )
        .subcommand(stage_command("parse", "Parse an uploaded document on the backend"))
        .subcommand(
            Command::new("parse-file")
                .about("Parse a local document without uploading it")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to parse; '-' reads stdin"),
                ),
        )
        .subcommand(
            Command::new("parse-url")
                .about("Fetch a document from a URL and parse it")
                .arg(Arg::new("url").required(true).value_name("URL")),
        )
        .subcommand(stage_command("generate", "Generate test cases"))
        .subcommand(stage_command("execute", "Execute generated tests"))
        .subcommand(stage_command("analyze", "Analyze test results"))
        .subcommand(stage_command("full", "Run generation and execution in one step"))
        .subcommand(
            stage_command("delete", "Delete a document").arg(
                Arg::new("yes")
                    .long("yes")
                    .short('y')
                    .action(ArgAction::SetTrue)
                    .help("Skip the confirmation prompt"),
            ),
        )
        .subcommand(
            Command::new("pipeline")
                .about("Upload, parse and run every stage for one file")
                .arg(file_arg())
                .arg(
                    Arg::new("full")
                        .long("full")
                        .action(ArgAction::SetTrue)
                        .help("Use the combined full-workflow stage"),
                ),
        )
        .subcommand(Command::new("show").about("Print the last parsed description"))
}
