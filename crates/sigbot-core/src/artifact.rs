//! Persisted artifact (`predictions.json`) and the append-only activity log.

use std::path::PathBuf;

use serde_json::Value;

use crate::{
    config::ArtifactPaths,
    domain::ActivityLogEntry,
    errors::Error,
    utils::{append_line, atomic_write, short_digest},
    Result,
};

/// Append-only `OK <message>` / `FAIL <message>` log, one line per ingestion attempt.
#[derive(Clone, Debug)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, entry: &ActivityLogEntry) -> Result<()> {
        append_line(&self.path, &entry.to_line())
    }

    /// Append, reporting failures to diagnostics instead of the caller.
    pub fn record(&self, entry: ActivityLogEntry) {
        if let Err(e) = self.append(&entry) {
            tracing::error!(path = %self.path.display(), line = %entry.to_line(), "activity log append failed: {e}");
        }
    }
}

/// Writes the canonical artifact atomically and logs every attempt.
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
    dest: PathBuf,
    staging_dir: PathBuf,
    log: ActivityLog,
}

impl ArtifactWriter {
    pub fn new(paths: &ArtifactPaths) -> Self {
        Self {
            dest: paths.predictions.clone(),
            staging_dir: paths.staging_dir.clone(),
            log: ActivityLog::new(&paths.activity_log),
        }
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Pretty-print `document` and replace the artifact.
    ///
    /// Never fails past this boundary: the outcome is the returned bool plus
    /// the activity log line. On failure the previous artifact is untouched.
    pub fn write(&self, document: &Value) -> bool {
        match self.try_write(document) {
            Ok(digest) => {
                self.log
                    .record(ActivityLogEntry::ok(format!("wrote {} sha256={digest}", self.file_name())));
                tracing::info!(path = %self.dest.display(), %digest, "artifact replaced");
                true
            }
            Err(e) => {
                self.log.record(ActivityLogEntry::fail(e.to_string()));
                tracing::warn!(path = %self.dest.display(), "artifact write failed: {e}");
                false
            }
        }
    }

    fn try_write(&self, document: &Value) -> Result<String> {
        let txt = serde_json::to_string_pretty(document)
            .map_err(|e| Error::Persistence(format!("serialize: {e}")))?;
        atomic_write(&self.dest, &self.staging_dir, txt.as_bytes()).map_err(|e| {
            Error::Persistence(format!("replace {}: {e}", self.dest.display()))
        })?;
        Ok(short_digest(txt.as_bytes()))
    }

    fn file_name(&self) -> String {
        self.dest
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.dest.display().to_string())
    }
}
