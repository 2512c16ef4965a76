//! `reporter`: prints the persisted predictions as a table.
//!
//! Exit codes: 0 ok, 2 generic failure, 3 missing file, 4 invalid JSON,
//! 5 schema error, 6 no valid signals.

use std::process::ExitCode;

use anyhow::Context;

use sigbot_core::{
    config::ReportConfig,
    ports::ArtifactSource,
    refresh::CommandArtifactSource,
    report::{load_signals, render, ReportError},
};

const EXIT_GENERIC: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(table) => {
            print!("{table}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run() -> anyhow::Result<String> {
    sigbot_core::logging::init("sigbot-report")?;

    let cfg = ReportConfig::load();
    let paths = &cfg.paths;

    if let Some(cmd) = &cfg.refresh_cmd {
        let mut source = CommandArtifactSource::new(cmd.clone());
        if let Some(home) = paths.dir.parent().filter(|p| p.is_dir()) {
            source = source.with_cwd(home);
        }
        source.refresh().await.context("refreshing artifact")?;
    }

    let doc = load_signals(&paths.predictions)?;
    tracing::info!(
        path = %paths.predictions.display(),
        signals = doc.signals.len(),
        "report rendered"
    );
    Ok(render(&doc))
}

fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<ReportError>()
        .and_then(|r| u8::try_from(r.exit_code()).ok())
        .unwrap_or(EXIT_GENERIC)
}
