// Shop Track Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopTrackError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Persist failed: {0}")]
    Persist(String),

    // One opaque message no matter which credential was wrong.
    #[error("Incorrect email or password")]
    Auth,

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Part index {index} out of range (list has {len} entries)")]
    PartIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ShopTrackError {
    fn from(err: anyhow::Error) -> Self {
        ShopTrackError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShopTrackError>;
