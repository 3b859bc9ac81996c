//! Error types for SFStore core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in SFStore core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] sfstore_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Record name contains a forbidden character or is too long.
    #[error("invalid record name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A record with this name already exists.
    #[error("record '{name}' already exists")]
    RecordAlreadyExists {
        /// Name of the record.
        name: String,
    },

    /// No record with this name exists.
    #[error("record '{name}' does not exist")]
    RecordNotFound {
        /// Name of the record.
        name: String,
    },

    /// Every directory slot is in use.
    #[error("directory full: all {capacity} record slots are in use")]
    DirectoryFull {
        /// Number of slots in the directory.
        capacity: usize,
    },

    /// Mutation attempted on a read-only storage or stream.
    #[error("not writable: {message}")]
    NotWritable {
        /// What was attempted.
        message: String,
    },

    /// Seek target is outside `0..=length`.
    #[error("invalid seek position {target}: record length is {length}")]
    InvalidSeekPosition {
        /// Requested absolute position.
        target: i128,
        /// Current record length.
        length: u64,
    },

    /// `set_len` was asked to grow a record.
    #[error("growing a record from {length} to {requested} bytes is not supported")]
    GrowNotSupported {
        /// Current record length.
        length: u64,
        /// Requested length.
        requested: u64,
    },

    /// A write would push the record past the 32-bit length field.
    #[error("record would exceed the maximum length of {max} bytes")]
    RecordTooLarge {
        /// Largest representable record length.
        max: u64,
    },

    /// Storage file does not exist.
    #[error("storage file not found: {}", path.display())]
    StorageNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Invalid storage file format.
    #[error("invalid storage format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A segment chain or directory slot is inconsistent.
    #[error("storage corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Creates a record already exists error.
    pub fn record_already_exists(name: impl Into<String>) -> Self {
        Self::RecordAlreadyExists { name: name.into() }
    }

    /// Creates a record not found error.
    pub fn record_not_found(name: impl Into<String>) -> Self {
        Self::RecordNotFound { name: name.into() }
    }

    /// Creates a not writable error.
    pub fn not_writable(message: impl Into<String>) -> Self {
        Self::NotWritable {
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}

impl From<CoreError> for io::Error {
    fn from(err: CoreError) -> Self {
        let kind = match &err {
            CoreError::Io(inner) => inner.kind(),
            CoreError::InvalidName { .. }
            | CoreError::InvalidSeekPosition { .. }
            | CoreError::GrowNotSupported { .. } => io::ErrorKind::InvalidInput,
            CoreError::RecordNotFound { .. } | CoreError::StorageNotFound { .. } => {
                io::ErrorKind::NotFound
            }
            CoreError::RecordAlreadyExists { .. } => io::ErrorKind::AlreadyExists,
            CoreError::NotWritable { .. } => io::ErrorKind::PermissionDenied,
            CoreError::InvalidFormat { .. } | CoreError::Corrupted { .. } => {
                io::ErrorKind::InvalidData
            }
            _ => io::ErrorKind::Other,
        };
        match err {
            CoreError::Io(inner) => inner,
            other => io::Error::new(kind, other),
        }
    }
}
