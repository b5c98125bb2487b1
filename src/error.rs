use std::path::PathBuf;

use thiserror::Error;

use crate::openrouter::OpenRouterError;

/// Failures reading the Messages store.
///
/// A chat name with no match is not an error: it produces an empty transcript.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("message store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("message store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid contacts file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("contact harvest failed: {0}")]
    Harvest(String),
}

/// Top-level error for the CLI and HTTP surfaces.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("summarization failed: {0}")]
    Summary(#[from] OpenRouterError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(String),

    #[error("cannot determine home directory")]
    HomeDirectoryNotFound,
}

pub type Result<T> = std::result::Result<T, AppError>;
