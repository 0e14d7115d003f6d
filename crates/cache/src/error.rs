//! Error types for the slot cache

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(slotcache::io),
        help("Check file permissions and ensure the cache directory exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "lock")
        operation: String,
    },

    /// Configuration or usage error
    #[error("Cache configuration error: {message}")]
    #[diagnostic(code(slotcache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Value encode/decode error at the get/put boundary
    #[error("Codec error: {message}")]
    #[diagnostic(code(slotcache::codec))]
    Codec {
        /// Error message from the codec
        message: String,
    },

    /// Snapshot destination already exists and overwrite was not requested
    #[error("Snapshot destination already exists: {}", path.display())]
    #[diagnostic(
        code(slotcache::snapshot_exists),
        help("Pass overwrite = true to replace an existing snapshot")
    )]
    SnapshotExists {
        /// The destination path that already exists
        path: Box<Path>,
    },

    /// Snapshot with the given name was not found
    #[error("Snapshot not found: {name}")]
    #[diagnostic(
        code(slotcache::snapshot_missing),
        help("Both the index and data images must exist under the cache directory")
    )]
    SnapshotMissing {
        /// The snapshot name that could not be resolved
        name: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a codec error
    #[must_use]
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec {
            message: msg.into(),
        }
    }

    /// Whether this error wraps an out-of-space condition on the underlying
    /// filesystem. Disk exhaustion during `put` is an expected steady-state
    /// outcome for a cache and is downgraded to a warning by the engines.
    #[must_use]
    pub fn is_disk_full(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::StorageFull,
            _ => false,
        }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
