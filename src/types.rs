//! Shared error type for the ingestion pipeline.

use thiserror::Error;

/// Errors surfaced by the pipeline stages and their external collaborators.
///
/// Only the index-clear step recovers from failure (see
/// [`pipeline::run`](crate::pipeline::run)); every other variant aborts the
/// run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Configuration is missing or malformed; raised before any stage runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// The source document could not be opened or parsed.
    #[error("document read error: {0}")]
    Read(String),

    /// The embedding service failed or returned an unusable response.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The vector index rejected or failed a request.
    #[error("index error: {0}")]
    Index(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
