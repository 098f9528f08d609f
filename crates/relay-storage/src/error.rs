//! Storage error types

use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Invalid API key")]
    InvalidApiKey,
}

pub type StorageResult<T> = Result<T, StorageError>;
