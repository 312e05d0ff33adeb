use lumina_shared::{PatchError, RecordId};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. writing a collection file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error while writing a collection.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record carries the requested id.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Insert of an id that already exists.
    #[error("Duplicate record id: {0}")]
    DuplicateId(RecordId),

    /// The patch could not be applied to the stored record.
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    /// Storage key is not usable as a file name.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Whether the backing storage itself failed (as opposed to a problem
    /// with the request).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(_) | Self::NoDataDir | Self::Io(_) | Self::Json(_) | Self::Migration(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
