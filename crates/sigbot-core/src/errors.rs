/// Core error type.
///
/// Adapter crates map their specific failures into this type so the binaries
/// can pick an exit code by kind instead of by message text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Network failure, timeout, or an unreadable response body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The message source answered but reported failure (`ok != true`).
    #[error("source error: {0}")]
    SourceProtocol(String),

    #[error("{0}")]
    Schema(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
