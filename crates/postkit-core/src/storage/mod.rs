//! Storage abstraction for persistence.
//!
//! A store is a flat map from string keys to serialized blobs. The editor
//! keeps one rotating autosave slot plus any number of saved artifacts.

mod autosave;
mod file;
mod memory;

pub use autosave::{AUTOSAVE_KEY, ARTIFACT_PREFIX, AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, artifact_key};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Key/blob store backing the persistence adapter.
///
/// Calls complete synchronously; the editor runs every handler to
/// completion before processing the next event.
pub trait Storage: Send + Sync {
    /// Write a blob, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Read a blob.
    fn get(&self, key: &str) -> StorageResult<String>;

    /// Remove a blob. Missing keys are not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}
