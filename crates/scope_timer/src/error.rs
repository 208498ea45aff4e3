//! Error types for scope timing.

use thiserror::Error;

/// Errors that can occur while opening scopes or emitting a report.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// A child scope was requested after the root scope was released
    #[error("cannot open scope `{name}`: root scope `{root}` is already closed")]
    ScopeClosed { name: String, root: String },

    /// Strict mode refused to render a tree containing an unreleased scope
    #[error("scope `{name}` was not released before its root")]
    UnreleasedScope { name: String },

    /// The sink or a config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export or config parsing failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for scope timing operations.
pub type Result<T> = std::result::Result<T, ScopeError>;
