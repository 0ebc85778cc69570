//! Error types for Firestore Tools

use thiserror::Error;

/// Core error type for Firestore Tools operations
#[derive(Error, Debug)]
pub enum FirestoreToolsError {
    /// A document path could not be parsed
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A collection or document does not exist in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store reported a failure
    #[error("Store error: {0}")]
    Store(String),

    /// Listing the root collections failed
    #[error("Failed to list root collections: {source}")]
    ListRoots { source: Box<FirestoreToolsError> },

    /// Listing the documents of a collection failed
    #[error("Failed to list documents of collection {path}: {source}")]
    ListDocuments {
        path: String,
        source: Box<FirestoreToolsError>,
    },

    /// Listing the child collections of a document failed
    #[error("Failed to list collections of document {path}: {source}")]
    ListCollections {
        path: String,
        source: Box<FirestoreToolsError>,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Firestore Tools operations
pub type Result<T> = std::result::Result<T, FirestoreToolsError>;

impl FirestoreToolsError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        FirestoreToolsError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Path of the node whose enumeration failed, if this is an enumeration error.
    pub fn failing_path(&self) -> Option<&str> {
        match self {
            FirestoreToolsError::ListDocuments { path, .. }
            | FirestoreToolsError::ListCollections { path, .. } => Some(path),
            FirestoreToolsError::ListRoots { .. } => Some(""),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FirestoreToolsError {
    fn from(err: serde_json::Error) -> Self {
        FirestoreToolsError::Serialization(err.to_string())
    }
}
