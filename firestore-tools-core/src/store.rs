//! Capability traits implemented by document store adapters
//!
//! The walker only needs three things from a store: the root collections,
//! the documents of a collection and the child collections of a document.
//! Adapters (the Firestore REST client, the in-memory store) implement these
//! traits so the traversal never depends on a concrete backend.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::NodePath;

/// A collection that can enumerate its documents
#[async_trait]
pub trait CollectionLike: Send + Sync {
    type Document: DocumentLike;

    /// Collection id within its parent.
    fn id(&self) -> &str;

    /// List the documents of this collection, in store order.
    async fn list_documents(&self) -> Result<Vec<Self::Document>>;
}

/// A document that can enumerate its child collections
#[async_trait]
pub trait DocumentLike: Send + Sync {
    type Collection: CollectionLike;

    /// Document id within its collection.
    fn id(&self) -> &str;

    /// List the sub-collections of this document, in store order.
    async fn list_collections(&self) -> Result<Vec<Self::Collection>>;
}

/// Entry point into a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Collection: CollectionLike<Document = Self::Document>;
    type Document: DocumentLike<Collection = Self::Collection>;

    /// List the top-level collections.
    async fn list_root_collections(&self) -> Result<Vec<Self::Collection>>;

    /// Handle for the collection at `path`.
    ///
    /// Existence is not guaranteed: a remote store hands out the handle
    /// without a round trip, and a collection that does not exist simply
    /// lists no documents.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not name a collection, or if the
    /// store can tell locally that the collection does not exist
    /// (`NotFound` from the in-memory store).
    fn collection(&self, path: &NodePath) -> Result<Self::Collection>;

    /// Handle for the document at `path`.
    ///
    /// Existence is not guaranteed: the Firestore adapter returns a handle
    /// for any document path, so a walk from an absent document emits that
    /// document and finds no sub-collections. The in-memory store checks
    /// and fails with `NotFound` instead.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not name a document, or if the
    /// store can tell locally that the document does not exist.
    fn document(&self, path: &NodePath) -> Result<Self::Document>;
}
