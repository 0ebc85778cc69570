//! In-memory document store
//!
//! Builder-style fixtures implementing the store traits. Any node can be
//! marked as failing, which makes its enumeration return a store error;
//! this is how traversal failures are exercised without a network.

use async_trait::async_trait;

use crate::error::{FirestoreToolsError, Result};
use crate::store::{CollectionLike, DocumentLike, DocumentStore};
use crate::types::{NodeKind, NodePath};

/// A collection held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCollection {
    id: String,
    documents: Vec<MemoryDocument>,
    failing: bool,
}

impl MemoryCollection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_document(mut self, document: MemoryDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Make `list_documents` fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn documents(&self) -> &[MemoryDocument] {
        &self.documents
    }

    fn find_document(&self, id: &str) -> Option<&MemoryDocument> {
        self.documents.iter().find(|d| d.id == id)
    }
}

/// A document held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    id: String,
    collections: Vec<MemoryCollection>,
    failing: bool,
}

impl MemoryDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_collection(mut self, collection: MemoryCollection) -> Self {
        self.collections.push(collection);
        self
    }

    /// Make `list_collections` fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn collections(&self) -> &[MemoryCollection] {
        &self.collections
    }

    fn find_collection(&self, id: &str) -> Option<&MemoryCollection> {
        self.collections.iter().find(|c| c.id == id)
    }
}

#[async_trait]
impl CollectionLike for MemoryCollection {
    type Document = MemoryDocument;

    fn id(&self) -> &str {
        &self.id
    }

    async fn list_documents(&self) -> Result<Vec<MemoryDocument>> {
        if self.failing {
            return Err(FirestoreToolsError::Store(format!(
                "listing documents of '{}' failed",
                self.id
            )));
        }
        Ok(self.documents.clone())
    }
}

#[async_trait]
impl DocumentLike for MemoryDocument {
    type Collection = MemoryCollection;

    fn id(&self) -> &str {
        &self.id
    }

    async fn list_collections(&self) -> Result<Vec<MemoryCollection>> {
        if self.failing {
            return Err(FirestoreToolsError::Store(format!(
                "listing collections of '{}' failed",
                self.id
            )));
        }
        Ok(self.collections.clone())
    }
}

/// A whole store held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    roots: Vec<MemoryCollection>,
    failing_roots: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: MemoryCollection) -> Self {
        self.roots.push(collection);
        self
    }

    /// Make `list_root_collections` fail.
    pub fn failing_roots(mut self) -> Self {
        self.failing_roots = true;
        self
    }

    /// Resolve a collection or document path to a subtree.
    fn resolve(&self, path: &NodePath) -> Option<Node<'_>> {
        let mut segments = path.segments().iter();
        let first = segments.next()?;
        let mut node = Node::Collection(self.roots.iter().find(|c| &c.id == first)?);

        for segment in segments {
            node = match node {
                Node::Collection(c) => Node::Document(c.find_document(segment)?),
                Node::Document(d) => Node::Collection(d.find_collection(segment)?),
            };
        }
        Some(node)
    }
}

enum Node<'a> {
    Collection(&'a MemoryCollection),
    Document(&'a MemoryDocument),
}

#[async_trait]
impl DocumentStore for MemoryStore {
    type Collection = MemoryCollection;
    type Document = MemoryDocument;

    async fn list_root_collections(&self) -> Result<Vec<MemoryCollection>> {
        if self.failing_roots {
            return Err(FirestoreToolsError::Store(
                "listing root collections failed".to_string(),
            ));
        }
        Ok(self.roots.clone())
    }

    fn collection(&self, path: &NodePath) -> Result<MemoryCollection> {
        if path.kind() != Some(NodeKind::Collection) {
            return Err(FirestoreToolsError::InvalidPath {
                path: path.to_string(),
                reason: "not a collection path".to_string(),
            });
        }
        match self.resolve(path) {
            Some(Node::Collection(c)) => Ok(c.clone()),
            _ => Err(FirestoreToolsError::NotFound(path.to_string())),
        }
    }

    fn document(&self, path: &NodePath) -> Result<MemoryDocument> {
        if path.kind() != Some(NodeKind::Document) {
            return Err(FirestoreToolsError::InvalidPath {
                path: path.to_string(),
                reason: "not a document path".to_string(),
            });
        }
        match self.resolve(path) {
            Some(Node::Document(d)) => Ok(d.clone()),
            _ => Err(FirestoreToolsError::NotFound(path.to_string())),
        }
    }
}
