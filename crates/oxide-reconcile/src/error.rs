//! Error types for schema reconciliation.

use std::path::PathBuf;

/// Errors that can occur while parsing, comparing or applying schema definitions.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A required input was empty or otherwise unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The definitions directory does not exist.
    #[error("Definitions directory not found: {0}")]
    NotFound(PathBuf),

    /// A script does not match the expected DDL statement shape.
    #[error("Failed to parse script '{script}': {message}")]
    Parse {
        /// First line of the offending script.
        script: String,
        /// What could not be recognised.
        message: String,
    },

    /// A statement was rejected by the executor.
    #[error(
        "Failed to execute {category} statement: {succeeded} of {total} statements succeeded before the failure: {source}"
    )]
    Execution {
        /// The batch or category being applied (e.g. "table create").
        category: String,
        /// Number of statements in this category that succeeded first.
        succeeded: usize,
        /// Number of statements in this category.
        total: usize,
        /// The underlying executor failure.
        #[source]
        source: Box<ReconcileError>,
    },

    /// Database error reported by the driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (reading definitions, writing exported scripts).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Builds a parse error that identifies the script by its first meaningful line.
    pub(crate) fn parse(script: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            script: script_preview(script),
            message: message.into(),
        }
    }
}

/// Returns the first non-blank line of a script, shortened to 100 characters.
#[must_use]
pub fn script_preview(script: &str) -> String {
    let Some(line) = script.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return "[empty script]".to_string();
    };

    if line.chars().count() > 100 {
        let short: String = line.chars().take(100).collect();
        format!("{short}...")
    } else {
        line.to_string()
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
