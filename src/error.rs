//! Error types shared by the category store, the host adapters and the session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CategorizerError {
    /// The host bookmark provider rejected a request (e.g. removal failed).
    #[error("Bookmark host error: {0}")]
    Host(String),

    /// The host persistence facility failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    /// The import document parsed but does not have the expected shape.
    #[error("Invalid import data: {0}")]
    InvalidImport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(usize),
}

pub type Result<T> = std::result::Result<T, CategorizerError>;
