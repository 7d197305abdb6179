//! Error taxonomy of a single sampling run.
//!
//! Core-path failures (connect, the `status` collector, publish) abort the run.
//! Optional-path failures (extended collectors, the sample cache) are logged
//! by the caller and degrade the snapshot instead of surfacing here.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server was unreachable or rejected the credentials.
    #[error("Connection: failed to connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: sqlx::Error,
    },

    /// A query of the named collector failed.
    #[error("Query: collector {collector} failed: {source}")]
    Query {
        collector: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The sample cache could not be read or written.
    #[error("Store: sample cache {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be serialized or written to the output.
    #[error("Publish: {0}")]
    Publish(#[from] PublishError),

    /// Invalid combination of settings.
    #[error("Config: {0}")]
    Config(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
