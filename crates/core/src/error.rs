//! Error types for typelite
//!
//! This module defines the error taxonomy shared by every layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Validation errors (`InvalidSchema`, `InvalidDocument`, `InvalidRequest`)
//! are always produced before any store call, so they never leave partial
//! state behind. Backend errors are wrapped with the operation and key that
//! failed instead of being handed to callers raw.

use crate::traits::StoreError;
use thiserror::Error;

/// Result type alias for typelite operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the search layer
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed collection definition
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Collection is not registered
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Collection has no primary-key field
    #[error("primary key missing in collection {0}")]
    PrimaryKeyMissing(String),

    /// Document violates the collection's field types or required fields
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Insert-only write hit an existing primary key
    #[error("document {id:?} already exists in collection {collection}")]
    DuplicateKey {
        /// Collection name
        collection: String,
        /// Primary key value
        id: String,
    },

    /// Search request references unknown or ineligible fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Backing store call failed
    #[error("storage failure during {op} on {key}: {source}")]
    StorageFailure {
        /// Logical operation that was running
        op: &'static str,
        /// Store key the operation touched
        key: String,
        /// Underlying backend error
        #[source]
        source: StoreError,
    },

    /// Document record was written but its index entries were not
    #[error("indexing failed for document {id:?} in collection {collection}: {source}")]
    IndexingFailed {
        /// Collection name
        collection: String,
        /// Primary key value
        id: String,
        /// What went wrong while updating postings
        #[source]
        source: Box<Error>,
    },

    /// Caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Caller deadline elapsed before the operation finished
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Encoding or decoding a stored value failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Engine configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a backend error with the operation and key that produced it
    pub fn storage(op: &'static str, key: impl Into<String>, source: StoreError) -> Self {
        Error::StorageFailure {
            op,
            key: key.into(),
            source,
        }
    }

    /// True for the errors a tripped [`Context`](crate::Context) produces
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
