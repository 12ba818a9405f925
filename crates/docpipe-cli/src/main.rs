//! `docpipe`: command-line front end for the document ingestion workflow

mod cli;
mod commands;
mod confirm;
mod output;

use docpipe_core::WorkflowError;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbosity: u8, json: bool) {
    let filter = if verbosity > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let matches = cli::build().get_matches();
    init_tracing(matches.get_count("verbose"), matches.get_flag("log-json"));

    if let Err(e) = commands::run(&matches).await {
        // Workflow failures were already surfaced as notifications
        if e.downcast_ref::<WorkflowError>().is_none() {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}
