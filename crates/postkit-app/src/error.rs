//! Editor session errors.

use postkit_core::canvas::DocumentError;
use postkit_core::config::ConfigError;
use postkit_core::storage::StorageError;
use postkit_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;
