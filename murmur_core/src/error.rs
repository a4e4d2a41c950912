//! Error types for corpus access.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while building a dataset or fetching records from it.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Invalid, missing or conflicting construction arguments.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Fetch index outside `[0, len)`.
    #[error("Index {index} out of range for dataset of length {len}")]
    Index {
        /// Requested index.
        index: usize,
        /// Number of rows in the table.
        len: usize,
    },

    /// Audio file missing or undecodable.
    #[error("Failed to load audio {}: {reason}", path.display())]
    AudioLoad {
        /// Absolute path of the clip.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Metadata table missing or malformed.
    #[error("Failed to read table {}: {reason}", path.display())]
    Table {
        /// Path of the table file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Resampler construction or processing failure.
    #[error("Resampling failed: {0}")]
    Resample(String),

    /// Feature extraction failure (empty or too-short waveform).
    #[error("Feature extraction failed: {0}")]
    Feature(String),

    /// Tokenizer loading or encoding failure.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file parse error.
    #[error("Config parse error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl DatasetError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn audio(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AudioLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for corpus operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Cloneable result, for items handed to data loaders that require `Clone`.
pub type SharedResult<T> = std::result::Result<T, Arc<DatasetError>>;
