use std::path::PathBuf;

use thiserror::Error;

/// Header store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error during read or write.
    #[error("store I/O error: {message}")]
    Io {
        /// Underlying error text
        message: String,
    },

    /// The store file is malformed.
    #[error("store corruption in {path}: {message}")]
    Corruption {
        /// Store file
        path: PathBuf,
        /// What was wrong
        message: String,
    },

    /// Another process holds the store.
    #[error("store already in use: {path}")]
    Locked {
        /// Lock file
        path: PathBuf,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}
