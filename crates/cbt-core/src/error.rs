//! Error types for cbt-core

use std::path::PathBuf;

/// Result type for cbt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a project configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A loaded document or a tool entry is not well formed
    #[error("Malformed configuration in {origin}: {message}")]
    MalformedFragment { origin: String, message: String },

    /// An imported or plugin-referenced file could not be read
    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    /// Sections without which no further validation is meaningful
    #[error("Required configuration section(s) missing: {}", .sections.join(", "))]
    RequiredSectionMissing { sections: Vec<String> },

    /// Every collected validation failure of one pass
    #[error(
        "Configuration failed validation with {} problem(s):\n  - {}",
        .failures.len(),
        .failures.join("\n  - ")
    )]
    Validation { failures: Vec<String> },

    /// A define or flag matcher entry has an unusable shape
    #[error("Invalid matcher '{matcher}' in {section}.{context}: {reason}")]
    InvalidMatcher {
        section: String,
        context: String,
        matcher: String,
        reason: String,
    },

    /// Attempt to redefine a flattened key that was never built
    #[error("Unknown configuration key: {key}")]
    UnknownKey { key: String },

    /// An embedded `#{...}` expression could not be evaluated
    #[error("Cannot evaluate expression '{expression}': {reason}")]
    Expression { expression: String, reason: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from cbt-fs
    #[error(transparent)]
    Fs(#[from] cbt_fs::Error),

    /// YAML (de)serialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
