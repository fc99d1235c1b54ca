use crate::DocId;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by index lookups and document loads.
///
/// A token missing from the index is not an error; lookups return an empty
/// posting list for it. Everything here means the query cannot be answered.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("index file {path} unavailable: {source}")]
    IndexUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt index {path} at byte {offset}: {reason}")]
    CorruptIndex {
        path: PathBuf,
        offset: u64,
        reason: String,
    },
    #[error("document {0} is referenced by a posting but missing from the location directory")]
    MissingDocument(DocId),
    #[error("document {path} unreadable: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Short machine-readable name, used by the HTTP layer.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::IndexUnavailable { .. } => "index_unavailable",
            SearchError::CorruptIndex { .. } => "corrupt_index",
            SearchError::MissingDocument(_) => "missing_document",
            SearchError::DocumentUnreadable { .. } => "document_unreadable",
            SearchError::Io(_) => "io",
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, offset: u64, reason: impl Into<String>) -> Self {
        SearchError::CorruptIndex { path: path.into(), offset, reason: reason.into() }
    }

    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SearchError::IndexUnavailable { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
