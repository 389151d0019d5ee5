//! Anvita CLI: upload files through the pre-signed URL flow.
//!
//! Set ANVITA_TOKEN and ANVITA_API_URL. One JSON document is printed per file.

use std::path::PathBuf;
use std::sync::Arc;

use anvita_api_client::{ApiClient, Session};
use anvita_cli::{init_tracing, outcome_json, request_for_path, request_for_remote};
use anvita_core::ClientConfig;
use anvita_upload::{UploadOrchestrator, UploadTracker};
use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "anvita", about = "Anvita upload CLI")]
struct Cli {
    /// Print progress updates to stderr
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more local files (audio, video, or document)
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Content type to use instead of guessing from the extension
        #[arg(long)]
        mime: Option<String>,
    },
    /// Fetch a remote file and upload it
    UploadUrl {
        /// URL of the file to download and upload
        url: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize outcome")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Failed to load configuration")?;

    let token = config
        .token
        .clone()
        .context("ANVITA_TOKEN must be set to start an upload session")?;
    let client = Arc::new(
        ApiClient::new(&config, Session::active(token)).context("Failed to create API client")?,
    );
    let tracker = Arc::new(UploadTracker::new());
    let orchestrator = UploadOrchestrator::new(client.clone(), tracker.clone())
        .with_completion_grace(config.completion_grace);

    let requests = match cli.command {
        Commands::Upload { files, mime } => {
            let mut requests = Vec::with_capacity(files.len());
            for file in &files {
                requests.push(request_for_path(file, mime.as_deref()).await?);
            }
            requests
        }
        Commands::UploadUrl { url } => {
            let info = client
                .probe_remote(&url)
                .await
                .with_context(|| format!("Failed to probe {}", url))?;
            vec![request_for_remote(&url, &info)]
        }
    };

    if cli.progress {
        let mut events = tracker.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if let Some(percent) = event.percent {
                    eprintln!("{} {}%", event.id, percent);
                }
            }
        });
    }

    let total = requests.len();
    let mut unfinished = 0usize;
    let outcomes = orchestrator.submit(requests);
    tokio::pin!(outcomes);
    while let Some(outcome) = outcomes.next().await {
        if !outcome.is_completed() {
            unfinished += 1;
        }
        print_json(&outcome_json(&outcome))?;
    }

    if unfinished > 0 {
        anyhow::bail!("{} of {} uploads did not complete", unfinished, total);
    }

    Ok(())
}
