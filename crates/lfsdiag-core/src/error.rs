//! Library-level error taxonomy for lfsdiag.

/// lfsdiag library errors.
#[derive(Debug, thiserror::Error)]
pub enum DiagError {
    #[error("git error: {0}")]
    Git(String),

    #[error("log not found: {0}")]
    LogNotFound(String),

    #[error("no logs in {0}")]
    NoLogs(std::path::PathBuf),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lfsdiag library operations.
pub type Result<T> = std::result::Result<T, DiagError>;
