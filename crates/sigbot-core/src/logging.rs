use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize diagnostics logging for one of the binaries.
///
/// Output goes to stderr; stdout is reserved for the machine-readable lines
/// (`NO_NEW_JSON`, the report table) that cron scripts consume.
pub fn init(service_name: &str) -> Result<()> {
    // Default: quiet. Can be overridden with `RUST_LOG`, e.g. `RUST_LOG=sigbot_core=debug`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}=warn", service_name.replace('-', "_"))));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))
}
