//! `poller`: one-shot Telegram ingestion, meant to be run from cron.
//!
//! Exit codes: 0 new artifact written, 1 `NO_NEW_JSON`, 2 config,
//! 7 transport, 8 source reported not-ok, 9 local state failure.

use std::{process::ExitCode, sync::Arc};

use anyhow::Context;

use sigbot_core::{
    config::Config,
    poller::{PollOutcome, PollSummary, Poller},
    Error,
};
use sigbot_telegram::TelegramClient;

const EXIT_NO_NEW_JSON: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_TRANSPORT: u8 = 7;
const EXIT_SOURCE_NOT_OK: u8 = 8;
const EXIT_STATE: u8 = 9;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(summary) => match summary.outcome {
            PollOutcome::Written { .. } => {
                println!("OK: predictions.json updated");
                ExitCode::SUCCESS
            }
            PollOutcome::NoNewJson => {
                println!("NO_NEW_JSON");
                ExitCode::from(EXIT_NO_NEW_JSON)
            }
        },
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run() -> anyhow::Result<PollSummary> {
    sigbot_core::logging::init("sigbot-poller")?;

    // Required env is checked before anything touches disk or network.
    let cfg = Config::load()?;
    cfg.paths
        .ensure_dirs()
        .with_context(|| format!("creating {}", cfg.paths.dir.display()))?;

    let client = Arc::new(TelegramClient::from_config(&cfg)?);
    let mut poller = Poller::from_config(&cfg);
    if cfg.notify_on_update {
        poller = poller.with_notifier(client.clone());
    }

    let summary = poller.run(client.as_ref()).await?;
    tracing::info!(
        offset_before = summary.offset_before,
        offset_after = summary.offset_after,
        updates = summary.updates_seen,
        outcome = ?summary.outcome,
        "poll finished"
    );
    Ok(summary)
}

fn exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<Error>() {
        Some(Error::Config(_)) => EXIT_CONFIG,
        Some(Error::Transport(_)) => EXIT_TRANSPORT,
        Some(Error::SourceProtocol(_)) => EXIT_SOURCE_NOT_OK,
        _ => EXIT_STATE,
    }
}
