//! Command-backed `ArtifactSource`: runs a shell command (e.g. a pull script)
//! that fetches a fresh `predictions.json`.

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{errors::Error, ports::ArtifactSource, utils::truncate_text, Result};

const STDERR_EXCERPT: usize = 200;

#[derive(Clone, Debug)]
pub struct CommandArtifactSource {
    command: String,
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl CommandArtifactSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ArtifactSource for CommandArtifactSource {
    async fn refresh(&self) -> Result<()> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.command).kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                Error::External(format!(
                    "refresh command timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| Error::External(format!("refresh command failed to start: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::External(format!(
                "refresh command exited with {}: {}",
                output.status,
                truncate_text(stderr.trim(), STDERR_EXCERPT)
            )));
        }

        tracing::debug!(command = %self.command, "artifact refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_command_is_ok() {
        CommandArtifactSource::new("true").refresh().await.unwrap();
    }

    #[tokio::test]
    async fn failing_command_is_observable() {
        let err = CommandArtifactSource::new("echo nope >&2; exit 3")
            .refresh()
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::External(_)));
        assert!(msg.contains("nope"), "{msg}");
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let err = CommandArtifactSource::new("sleep 5")
            .with_timeout(Duration::from_millis(100))
            .refresh()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn runs_in_configured_directory() {
        let dir = crate::utils::scratch_dir("sigbot-refresh-cwd");
        CommandArtifactSource::new("touch pulled.json")
            .with_cwd(&dir)
            .refresh()
            .await
            .unwrap();
        assert!(dir.join("pulled.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
