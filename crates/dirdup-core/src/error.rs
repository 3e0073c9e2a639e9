//! Error types for dirdup core
//!
//! Provides error handling for:
//! - Per-file rewrite failures (reported in the manifest, never fatal)
//! - Host collaborator failures (copy, identifier refresh)
//! - Configuration loading and validation
//! - Operation-level preconditions of a duplication

use dirdup_document::DocumentError;
use std::path::{Path, PathBuf};

/// Failure of one document rewrite task
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Reading or writing a document failed
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// File the operation targeted
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Parsing, serializing or arranging the document failed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Task panicked or was aborted by the runtime
    #[error("task did not complete: {0}")]
    TaskAborted(String),
}

impl RewriteError {
    /// Create io error for a path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the failure came from the document layer
    #[inline]
    #[must_use]
    pub fn is_document_error(&self) -> bool {
        matches!(self, Self::Document(_))
    }
}

/// Failure of a host collaborator
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Filesystem failure while copying or minting identifiers
    #[error("io error on {}: {source}", path.display())]
    Io {
        /// File the operation targeted
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failure
    #[error("walk error under {}: {message}", root.display())]
    Walk {
        /// Root being traversed
        root: PathBuf,
        /// Traversal message
        message: String,
    },
}

impl HostError {
    /// Create io error for a path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<walkdir::Error> for HostError {
    fn from(err: walkdir::Error) -> Self {
        let root = err.path().map(Path::to_path_buf).unwrap_or_default();
        Self::Walk {
            root,
            message: err.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the expected shape
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// Field value rejected by validation
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid-value error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Operation-level duplication error
#[derive(Debug, thiserror::Error)]
pub enum DuplicateError {
    /// Origin path does not exist
    #[error("origin does not exist: {}", .0.display())]
    OriginMissing(PathBuf),

    /// Origin path is a file, not a directory
    #[error("origin is not a directory: {}", .0.display())]
    OriginNotDirectory(PathBuf),

    /// Target path is already taken
    #[error("target already exists: {}", .0.display())]
    TargetExists(PathBuf),

    /// Target would be created inside the tree being copied
    #[error("target {} lies inside origin {}", target.display(), origin.display())]
    TargetInsideOrigin {
        /// Origin root
        origin: PathBuf,
        /// Requested target
        target: PathBuf,
    },

    /// A tree root could not be enumerated
    #[error("cannot enumerate {}: {message}", root.display())]
    Enumeration {
        /// Root being enumerated
        root: PathBuf,
        /// Traversal message
        message: String,
    },

    /// Host collaborator failed
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DuplicateError {
    /// Create enumeration error for a root
    #[inline]
    pub fn enumeration(root: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Enumeration {
            root: root.into(),
            message: message.into(),
        }
    }

    /// Check if the error was raised before anything was written
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::OriginMissing(_)
                | Self::OriginNotDirectory(_)
                | Self::TargetExists(_)
                | Self::TargetInsideOrigin { .. }
                | Self::Config(_)
        )
    }
}

/// Result alias for operation-level calls
pub type Result<T> = std::result::Result<T, DuplicateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use dirdup_document::ArrangeError;

    #[test]
    fn rewrite_error_display_names_path() {
        let err = RewriteError::io_error(
            "Assets/A.asset",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let text = err.to_string();
        assert!(text.contains("Assets/A.asset"));
        assert!(text.contains("gone"));
        assert!(!err.is_document_error());
    }

    #[test]
    fn document_errors_convert_transparently() {
        let err: RewriteError =
            DocumentError::from(ArrangeError::SeparatorSurplus { remaining: 2 }).into();
        assert!(err.is_document_error());
        assert!(err.to_string().contains("2 original separators"));
    }

    #[test]
    fn duplicate_error_classification() {
        assert!(DuplicateError::TargetExists(PathBuf::from("x")).is_precondition());
        assert!(DuplicateError::Config(ConfigError::invalid("max_concurrency", "zero")).is_precondition());
        assert!(!DuplicateError::enumeration("x", "denied").is_precondition());
    }

    #[test]
    fn host_error_lifts_into_duplicate_error() {
        let err: DuplicateError = HostError::io_error(
            "B",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert!(matches!(err, DuplicateError::Host(HostError::Io { .. })));
    }
}
