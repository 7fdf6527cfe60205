//! Error types for docstore
//!
//! Error codes:
//! - DOCSTORE_INVALID_DOCUMENT (ERROR)
//! - DOCSTORE_DOCUMENT_TOO_LARGE (ERROR)
//! - DOCSTORE_INVALID_NAMESPACE (ERROR)
//! - DOCSTORE_DATA_CORRUPTION (FATAL)
//! - DOCSTORE_CONFIG_ERROR (ERROR)
//! - DOCSTORE_IO_ERROR (ERROR)
//! - DOCSTORE_SERIALIZATION_ERROR (ERROR)
//!
//! Structural inconsistencies found by `validate` are not errors. They are
//! reported through `ValidationReport::valid`.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::document::DocumentId;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the store stays usable
    Error,
    /// Stored data can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert was given something that is not a well-formed document
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Encoded document exceeds `max_document_bytes`
    #[error("document is {size} bytes, exceeds limit of {max} bytes")]
    DocumentTooLarge { size: usize, max: usize },

    /// Collection name cannot be used
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    /// A stored record failed checksum or decoding
    #[error("data corruption in record {id}: {reason}")]
    DataCorruption { id: DocumentId, reason: String },

    /// Configuration could not be loaded or is out of range
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidDocument(_) => "DOCSTORE_INVALID_DOCUMENT",
            StoreError::DocumentTooLarge { .. } => "DOCSTORE_DOCUMENT_TOO_LARGE",
            StoreError::InvalidNamespace(_) => "DOCSTORE_INVALID_NAMESPACE",
            StoreError::DataCorruption { .. } => "DOCSTORE_DATA_CORRUPTION",
            StoreError::Config(_) => "DOCSTORE_CONFIG_ERROR",
            StoreError::Io(_) => "DOCSTORE_IO_ERROR",
            StoreError::Serialization(_) => "DOCSTORE_SERIALIZATION_ERROR",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            StoreError::DataCorruption { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this error means stored data is untrustworthy
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub(crate) fn invalid_document(reason: impl Into<String>) -> Self {
        StoreError::InvalidDocument(reason.into())
    }

    pub(crate) fn corruption(id: DocumentId, reason: impl Into<String>) -> Self {
        StoreError::DataCorruption {
            id,
            reason: reason.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
