//! Fatal error taxonomy for load-time failures.
//!
//! Transient backend failures (cache, vector index) are handled locally and
//! never surface through these types; only errors that make the engine unable
//! to serve requests belong here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that are fatal at construction time.
#[derive(Debug, Error)]
pub enum LexError {
    /// The knowledge graph file could not be read or parsed.
    #[error("failed to load knowledge graph from {path}")]
    GraphLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// One of the citation reference tables could not be read or parsed.
    #[error("failed to load citation reference database from {path}")]
    ReferenceDbLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// Configuration is structurally invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Underlying cause of a load failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
