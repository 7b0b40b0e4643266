//! Error types for update-stemcell.
//!
//! All operations return `Result<T>` which aliases `Result<T, UpdateError>`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from manifest update operations.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Manifest is missing or cannot be read.
    #[error("Manifest not found or unreadable: {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Field query does not resolve against the manifest.
    #[error("Cannot resolve '{query}': {reason}")]
    Schema { query: String, reason: String },

    /// Updated manifest could not be persisted.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Target value exists but cannot be rewritten on its own line.
    #[error("Cannot edit '{query}' in place: {reason}")]
    UnsupportedLayout { query: String, reason: String },

    /// Malformed field query.
    #[error("Invalid path '{0}': {1}")]
    InvalidQuery(String, String),

    /// Version string cannot be written as a single scalar.
    #[error("Invalid version '{0}': {1}")]
    InvalidVersion(String, String),

    /// Manifest is not well-formed YAML.
    #[error("Malformed manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UpdateError {
    pub(crate) fn schema(query: impl ToString, reason: impl Into<String>) -> Self {
        Self::Schema {
            query: query.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(query: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnsupportedLayout {
            query: query.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for update-stemcell operations.
pub type Result<T> = std::result::Result<T, UpdateError>;
