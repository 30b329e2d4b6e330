use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for update-version operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("History unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Pattern not found: no `{variable} = '...'` line in {}", path.display())]
    PatternNotFound { path: PathBuf, variable: String },

    #[error("Ambiguous pattern: {count} `{variable} = '...'` lines in {}", path.display())]
    AmbiguousPattern {
        path: PathBuf,
        variable: String,
        count: usize,
    },

    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Tag failed: {0}")]
    TagFailed(String),

    #[error("Working tree has uncommitted changes: {}", .0.join(", "))]
    DirtyWorkingTree(Vec<String>),

    #[error("Cannot access target file {}: {source}", path.display())]
    TargetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("{cause}; rollback failed: {}", join_errors(.rollback))]
    RollbackFailed {
        cause: Box<ReleaseError>,
        rollback: Vec<ReleaseError>,
    },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),
}

/// Convenience type alias for Results in update-version
pub type Result<T> = std::result::Result<T, ReleaseError>;

fn join_errors(errors: &[ReleaseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ReleaseError {
    /// Create a history error with context
    pub fn history(msg: impl Into<String>) -> Self {
        ReleaseError::HistoryUnavailable(msg.into())
    }

    /// Create a commit error with context
    pub fn commit(msg: impl Into<String>) -> Self {
        ReleaseError::CommitFailed(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ReleaseError::TagFailed(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::Version(msg.into())
    }

    pub fn target_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReleaseError::TargetIo {
            path: path.into(),
            source,
        }
    }
}
