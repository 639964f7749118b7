//! Command-line frontend for the streaming regulation analysis client.
//!
//! Submits one text, drives the event stream into a transcript and renders
//! the final message. Ctrl-C and the optional timeout cancel the stream;
//! events received up to that point are still rendered.

mod render;

pub mod config;

use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::Parser;
use reglens_core::AnalysisClient;
use reglens_core::AnalysisOutcome;
use reglens_core::Transcript;
use reglens_core::drive;
use reglens_core::protocol::model::Severity;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "reglens",
    version,
    about = "Stream a regulation analysis for a text and render the result"
)]
pub struct Cli {
    /// Text to analyze. Read from stdin when omitted.
    pub text: Option<String>,

    /// Base URL of the analysis backend.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Cancel the analysis after this many seconds. Zero disables the
    /// timeout.
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Hide considerations and highlights below this severity
    /// (low, medium or high).
    #[arg(long, value_name = "LEVEL", value_parser = severity_from_arg)]
    pub min_severity: Option<Severity>,

    /// Print the final status, index and annotated text as JSON.
    #[arg(long)]
    pub json: bool,
}

fn severity_from_arg(raw: &str) -> Result<Severity, String> {
    Severity::parse(raw).ok_or_else(|| format!("expected low, medium or high, got `{raw}`"))
}

pub async fn run_main(cli: Cli) -> Result<()> {
    init_logging();

    let config = Config::load(Overrides {
        base_url: cli.base_url,
        timeout_secs: cli.timeout_secs,
        min_severity: cli.min_severity,
    })?;

    let text = match cli.text {
        Some(text) => text,
        None => read_stdin().await?,
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(anyhow!("no text to analyze"));
    }

    let cancel = CancellationToken::new();
    spawn_cancel_on_ctrl_c(cancel.clone());
    if config.timeout_secs > 0 {
        spawn_cancel_after(cancel.clone(), Duration::from_secs(config.timeout_secs));
    }

    let client = AnalysisClient::new(&config.base_url);
    let mut transcript = Transcript::new();
    let id = transcript.submit(text.clone());

    let stream = tokio::select! {
        _ = cancel.cancelled() => {
            transcript.finalize(id, AnalysisOutcome::Interrupted)?;
            return Err(anyhow!("analysis interrupted"));
        }
        result = client.analyze(&text) => match result {
            Ok(stream) => stream,
            Err(error) => {
                let reason = error.to_string();
                transcript.finalize(id, AnalysisOutcome::Failed { reason: reason.clone() })?;
                return Err(anyhow!(reason));
            }
        },
    };

    let outcome = drive(&mut transcript, id, stream, &cancel).await?;

    let message = transcript
        .analysis(id)
        .ok_or_else(|| anyhow!("analysis message missing from transcript"))?;

    // Render before reporting a failure so partial results are not lost.
    if cli.json {
        // JSON output is for downstream tooling and stays unfiltered.
        let report = serde_json::json!({
            "status": message.display_text(),
            "index": message.index(),
            "annotated_text": message.annotated_text(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mut stdout = std::io::stdout().lock();
        render::render_message(&mut stdout, message, config.min_severity)?;
    }

    match outcome {
        AnalysisOutcome::Completed => Ok(()),
        AnalysisOutcome::Failed { reason } => Err(anyhow!(reason)),
        AnalysisOutcome::Interrupted => Err(anyhow!("analysis interrupted")),
    }
}

fn init_logging() {
    let default_level = "reglens=info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn read_stdin() -> Result<String> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read text from stdin")?;
    Ok(text)
}

fn spawn_cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling analysis");
            cancel.cancel();
        }
    });
}

fn spawn_cancel_after(cancel: CancellationToken, timeout: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::info!(seconds = timeout.as_secs(), "analysis timed out; cancelling");
        cancel.cancel();
    });
}
