use async_trait::async_trait;

use crate::{domain::RemoteUpdate, Result};

/// Hexagonal port for the message source (Telegram `getUpdates` today).
///
/// One call per poller invocation; no retry. Implementations map network
/// failures and timeouts to `Error::Transport` and a not-ok answer to
/// `Error::SourceProtocol`.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Updates strictly after `offset` when `offset > 0`, else the latest page.
    async fn fetch(&self, offset: i64) -> Result<Vec<RemoteUpdate>>;
}

/// Outbound human-readable alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Something that can bring the persisted artifact up to date before it is read.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}
