//! One-shot ingestion pass: fetch → filter → extract → validate → persist.
//!
//! Invoked repeatedly by an external scheduler; there is no loop here.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    artifact::ArtifactWriter,
    config::Config,
    domain::{ActivityLogEntry, RemoteUpdate},
    errors::Error,
    extract::extract_json,
    offset::OffsetStore,
    ports::{Notifier, UpdateSource},
    utils::truncate_text,
    validate::validate_payload,
    Result,
};

const NOTIFY_MAX_LEN: usize = 4000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// At least one payload was validated and persisted.
    Written { artifacts: usize },
    /// The batch ran fine but produced nothing new (`NO_NEW_JSON`).
    NoNewJson,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSummary {
    pub outcome: PollOutcome,
    pub offset_before: i64,
    pub offset_after: i64,
    pub updates_seen: usize,
}

pub struct Poller {
    chat_id: String,
    offsets: OffsetStore,
    writer: ArtifactWriter,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Poller {
    pub fn new(chat_id: impl Into<String>, offsets: OffsetStore, writer: ArtifactWriter) -> Self {
        Self {
            chat_id: chat_id.into(),
            offsets,
            writer,
            notifier: None,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.chat_id.clone(),
            OffsetStore::new(&cfg.paths.state, &cfg.paths.staging_dir),
            ArtifactWriter::new(&cfg.paths),
        )
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run a single poll against `source`.
    ///
    /// Fetch failures abort before anything is written. Per-message extraction
    /// misses and schema failures are skipped (schema failures land in the
    /// activity log). The offset is persisted only when it advanced.
    pub async fn run(&self, source: &dyn UpdateSource) -> Result<PollSummary> {
        let offset = self.offsets.get();
        let updates = source.fetch(offset).await?;
        tracing::debug!(offset, count = updates.len(), "fetched updates");

        let mut latest = offset;
        let mut written = 0usize;
        let mut last_doc: Option<Value> = None;

        for upd in &updates {
            latest = latest.max(upd.sequence_id.saturating_add(1));

            if let Some(doc) = self.ingest(upd) {
                written += 1;
                last_doc = Some(doc);
            }
        }

        if latest != offset {
            self.offsets
                .set(latest)
                .map_err(|e| Error::Persistence(format!("offset state: {e}")))?;
        }

        if let (Some(doc), Some(notifier)) = (&last_doc, &self.notifier) {
            if let Err(e) = notifier.notify(&self.chat_id, &notification_text(doc)).await {
                tracing::warn!("update notification failed: {e}");
            }
        }

        let outcome = if written > 0 {
            PollOutcome::Written { artifacts: written }
        } else {
            PollOutcome::NoNewJson
        };

        Ok(PollSummary {
            outcome,
            offset_before: offset,
            offset_after: latest,
            updates_seen: updates.len(),
        })
    }

    fn ingest(&self, upd: &RemoteUpdate) -> Option<Value> {
        if upd.chat_id != self.chat_id {
            tracing::debug!(update_id = upd.sequence_id, chat = %upd.chat_id, "skipping foreign chat");
            return None;
        }

        let candidate = extract_json(&upd.text)?;

        match validate_payload(&candidate) {
            Ok(doc) => self.writer.write(&doc).then_some(doc),
            Err(e) => {
                tracing::warn!(update_id = upd.sequence_id, "rejected payload: {e}");
                self.writer.log().record(ActivityLogEntry::fail(e.to_string()));
                None
            }
        }
    }
}

/// Human-readable summary of a freshly persisted document.
pub fn notification_text(doc: &Value) -> String {
    let mut lines = vec!["📈 New predictions:".to_string()];
    if let Some(signals) = doc.get("signals").and_then(Value::as_array) {
        for s in signals {
            lines.push(format!(
                "{} → {} ({})",
                display(s.get("symbol")),
                display(s.get("action")),
                display(s.get("confidence"))
            ));
        }
    }
    truncate_text(&lines.join("\n"), NOTIFY_MAX_LEN)
}

fn display(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "?".to_string(),
    }
}
