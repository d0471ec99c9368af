use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the archival pipeline. Every variant is fatal for the
/// pass that raised it: the pass transaction rolls back and remaining
/// snapshot files are left untouched.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("malformed snapshot stamp {value:?}")]
    MalformedStamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("malformed stored date {value:?} for title {title:?}")]
    MalformedRow {
        title: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("snapshot {name} stamps earlier than already-archived {prev}")]
    OutOfOrder { name: String, prev: String },
    #[error("i/o failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage failure")]
    Storage(#[from] rusqlite::Error),
}

impl ArchiveError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
