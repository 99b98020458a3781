//! Error types and error reporting
//!
//! Leaf errors come from the collaborators (storage backend, codec, cipher).
//! `StoreError` wraps them with the operation that failed and the store name.
//! Save failures are turned into an `ErrorReport` and handed to an
//! `ErrorReporter`. Load and delete failures are returned to the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure inside a key-value storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to read or write a file.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend rejected the operation (quota, security policy, ...).
    #[error("storage backend error: {0}")]
    Rejected(String),

    /// No backend is reachable (e.g. `localStorage` disabled).
    #[error("storage is unavailable")]
    Unavailable,
}

impl BackendError {
    /// Create an IO error with the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure turning state into text or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The record parsed, but the top level is not an object.
    #[error("record is not an object of fields")]
    NotAnObject,

    /// Raised by a custom codec.
    #[error("{0}")]
    Custom(String),
}

/// Failure in the encryption envelope.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("ciphertext is truncated")]
    Truncated,

    #[error("encryption failed")]
    Encrypt,

    /// Authentication failed: wrong secret or a tampered record.
    #[error("decryption failed")]
    Decrypt,

    #[error("decrypted record is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The underlying cause of a store operation failure.
#[derive(Debug, Error)]
pub enum StoreFailure {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Errors raised by `PersistenceStore` operations. Every variant carries the
/// store name.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to save state for store '{store_name}'")]
    Save {
        store_name: String,
        #[source]
        source: StoreFailure,
    },

    #[error("error loading store '{store_name}' from storage")]
    Load {
        store_name: String,
        #[source]
        source: StoreFailure,
    },

    #[error("unable to delete state for store '{store_name}'")]
    Delete {
        store_name: String,
        #[source]
        source: StoreFailure,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn save(store_name: impl Into<String>, source: impl Into<StoreFailure>) -> Self {
        Self::Save {
            store_name: store_name.into(),
            source: source.into(),
        }
    }

    pub fn load(store_name: impl Into<String>, source: impl Into<StoreFailure>) -> Self {
        Self::Load {
            store_name: store_name.into(),
            source: source.into(),
        }
    }

    pub fn delete(store_name: impl Into<String>, source: impl Into<StoreFailure>) -> Self {
        Self::Delete {
            store_name: store_name.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Save { .. } => ErrorKind::StorageSaveError,
            StoreError::Load { .. } => ErrorKind::StorageLoadError,
            StoreError::Delete { .. } => ErrorKind::StorageDeleteError,
        }
    }

    pub fn store_name(&self) -> &str {
        match self {
            StoreError::Save { store_name, .. }
            | StoreError::Load { store_name, .. }
            | StoreError::Delete { store_name, .. } => store_name,
        }
    }

    pub fn failure(&self) -> &StoreFailure {
        match self {
            StoreError::Save { source, .. }
            | StoreError::Load { source, .. }
            | StoreError::Delete { source, .. } => source,
        }
    }

    /// Build the structured report describing this error.
    pub fn report(&self) -> ErrorReport {
        let mut info = BTreeMap::new();
        info.insert("storeName".to_string(), self.store_name().to_string());

        ErrorReport {
            kind: self.kind(),
            message: self.kind().message().to_string(),
            info,
            severity: Severity::Error,
            cause: Some(error_chain(self.failure())),
        }
    }
}

/// Render an error and all of its sources as `outer: inner: ...`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        source = inner.source();
    }
    rendered
}

/// Category of a store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    StorageSaveError,
    StorageLoadError,
    StorageDeleteError,
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::StorageSaveError => "STORAGE_SAVE_ERROR",
            ErrorKind::StorageLoadError => "STORAGE_LOAD_ERROR",
            ErrorKind::StorageDeleteError => "STORAGE_DELETE_ERROR",
        }
    }

    /// Human-readable summary
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::StorageSaveError => "Unable to save state",
            ErrorKind::StorageLoadError => "Error loading from storage",
            ErrorKind::StorageDeleteError => "Unable to delete state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How bad a reported error is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

/// Structured description of a failure, handed to an `ErrorReporter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    /// Contextual key/value pairs; always contains `storeName`
    pub info: BTreeMap<String, String>,
    pub severity: Severity,
    /// Rendered source chain, if any
    pub cause: Option<String>,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        for (key, value) in &self.info {
            write!(f, " {key}={value}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}

/// Sink for non-fatal failures.
pub trait ErrorReporter {
    fn report(&self, report: &ErrorReport);
}

impl<F> ErrorReporter for F
where
    F: Fn(&ErrorReport),
{
    fn report(&self, report: &ErrorReport) {
        self(report)
    }
}

/// Reporter that writes through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, report: &ErrorReport) {
        match report.severity {
            Severity::Warning => log::warn!("{report}"),
            Severity::Error | Severity::Fatal => log::error!("{report}"),
        }
    }
}
