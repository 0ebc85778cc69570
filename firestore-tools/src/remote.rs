//! Firestore-backed implementation of the store traits
//!
//! Handles are cheap: each one carries a shared client and its path
//! relative to the database. Nothing is fetched until the walker asks a
//! handle for its children.

use async_trait::async_trait;
use firestore_tools_core::{
    CollectionLike, DocumentLike, DocumentStore, FirestoreToolsError, NodeKind, NodePath,
};
use std::sync::Arc;

use crate::client::FirestoreClient;

fn store_error(err: anyhow::Error) -> FirestoreToolsError {
    FirestoreToolsError::Store(format!("{:#}", err))
}

/// A collection on the server
#[derive(Debug, Clone)]
pub struct RemoteCollection {
    client: Arc<FirestoreClient>,
    /// Path relative to the database, e.g. `users/alice/posts`
    path: String,
    id: String,
}

/// A document on the server
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    client: Arc<FirestoreClient>,
    /// Path relative to the database, e.g. `users/alice`
    path: String,
    id: String,
}

impl RemoteCollection {
    fn new(client: Arc<FirestoreClient>, parent: Option<&str>, id: &str) -> Self {
        Self {
            path: relative_child(parent, id),
            id: id.to_string(),
            client,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RemoteDocument {
    fn new(client: Arc<FirestoreClient>, parent: &str, id: &str) -> Self {
        Self {
            path: relative_child(Some(parent), id),
            id: id.to_string(),
            client,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn relative_child(parent: Option<&str>, id: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, id),
        _ => id.to_string(),
    }
}

#[async_trait]
impl CollectionLike for RemoteCollection {
    type Document = RemoteDocument;

    fn id(&self) -> &str {
        &self.id
    }

    async fn list_documents(&self) -> firestore_tools_core::Result<Vec<RemoteDocument>> {
        let documents = self
            .client
            .list_documents(&self.path)
            .await
            .map_err(store_error)?;

        Ok(documents
            .iter()
            .map(|doc| RemoteDocument::new(Arc::clone(&self.client), &self.path, doc.id()))
            .collect())
    }
}

#[async_trait]
impl DocumentLike for RemoteDocument {
    type Collection = RemoteCollection;

    fn id(&self) -> &str {
        &self.id
    }

    async fn list_collections(&self) -> firestore_tools_core::Result<Vec<RemoteCollection>> {
        let ids = self
            .client
            .list_collection_ids(Some(&self.path))
            .await
            .map_err(store_error)?;

        Ok(ids
            .iter()
            .map(|id| RemoteCollection::new(Arc::clone(&self.client), Some(&self.path), id))
            .collect())
    }
}

/// The Firestore database reachable through a [`FirestoreClient`]
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Arc<FirestoreClient>,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &FirestoreClient {
        &self.client
    }

    fn split(path: &NodePath) -> (Option<String>, String) {
        let parent = path
            .parent()
            .filter(|p| !p.is_root())
            .map(|p| p.relative());
        let id = path.id().unwrap_or_default().to_string();
        (parent, id)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    type Collection = RemoteCollection;
    type Document = RemoteDocument;

    async fn list_root_collections(&self) -> firestore_tools_core::Result<Vec<RemoteCollection>> {
        let ids = self
            .client
            .list_collection_ids(None)
            .await
            .map_err(store_error)?;

        Ok(ids
            .iter()
            .map(|id| RemoteCollection::new(Arc::clone(&self.client), None, id))
            .collect())
    }

    fn collection(&self, path: &NodePath) -> firestore_tools_core::Result<RemoteCollection> {
        if path.kind() != Some(NodeKind::Collection) {
            return Err(FirestoreToolsError::InvalidPath {
                path: path.to_string(),
                reason: "not a collection path".to_string(),
            });
        }
        let (parent, id) = Self::split(path);
        Ok(RemoteCollection::new(
            Arc::clone(&self.client),
            parent.as_deref(),
            &id,
        ))
    }

    fn document(&self, path: &NodePath) -> firestore_tools_core::Result<RemoteDocument> {
        if path.kind() != Some(NodeKind::Document) {
            return Err(FirestoreToolsError::InvalidPath {
                path: path.to_string(),
                reason: "not a document path".to_string(),
            });
        }
        let (parent, id) = Self::split(path);
        Ok(RemoteDocument::new(
            Arc::clone(&self.client),
            parent.as_deref().unwrap_or_default(),
            &id,
        ))
    }
}
