//! Error types for labdoc.
//!
//! Library crates use [`LabdocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for reporting.

use std::path::PathBuf;

/// Top-level error type for all labdoc operations.
#[derive(Debug, thiserror::Error)]
pub enum LabdocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A `git` invocation failed to start or exited unsuccessfully.
    #[error("git error: {0}")]
    Git(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (unknown filter name, bad threshold, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabdocError>;

impl LabdocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a git error from any displayable message.
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LabdocError::config("unknown filter 'foo'");
        assert_eq!(err.to_string(), "config error: unknown filter 'foo'");

        let err = LabdocError::git("`git rev-parse HEAD` exited with status 128");
        assert!(err.to_string().starts_with("git error:"));
        assert!(err.to_string().contains("status 128"));
    }

    #[test]
    fn io_error_carries_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = LabdocError::io("docs/index.html", source);
        assert!(err.to_string().contains("docs/index.html"));
    }

    #[test]
    fn json_error_converts() {
        let err: LabdocError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, LabdocError::Json(_)));
    }
}
