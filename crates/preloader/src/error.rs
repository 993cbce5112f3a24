#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("preload of {url} failed: {reason}")]
    Hint { url: String, reason: String },

    #[error("preload of {url} did not settle within {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("resource not found: {0}")]
    NotFound(PathBuf),

    #[error("url cannot be resolved to a local resource: {0}")]
    InvalidUrl(String),

    #[error("no tokio runtime available to run the scheduler")]
    NoRuntime,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("behavior log encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
