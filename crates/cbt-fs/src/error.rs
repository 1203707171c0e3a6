//! Error types for cbt-fs

use std::path::PathBuf;

/// Result type for cbt-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cbt-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    GlobPattern { pattern: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn glob(pattern: &str, source: glob::PatternError) -> Self {
        Self::GlobPattern {
            pattern: pattern.to_string(),
            message: source.msg.to_string(),
        }
    }
}
