//! Depth-first, pre-order traversal of a collection/document hierarchy.
//!
//! The walker keeps its own worklist instead of recursing, so deep trees do
//! not grow the call stack. Children are pushed in reverse so that popping
//! the stack yields them in store order, which makes the emission sequence
//! identical to a recursive pre-order walk:
//!
//! ```text
//! /A            collection
//! /A/b          document
//! /A/b/C        collection
//! /A/b/C/d      document
//! /A/e          document
//! ```
//!
//! Enumeration errors abort the walk immediately. Everything emitted before
//! the failure has already reached the sink; nothing after it is emitted.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::{FirestoreToolsError, Result};
use crate::sink::VisitSink;
use crate::store::{CollectionLike, DocumentLike, DocumentStore};
use crate::types::{join_path, NodeKind, NodePath, Visit, WalkSummary};

/// Options controlling a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Deepest level to expand; nodes at this depth are emitted but their
    /// children are not listed. `None` walks the whole tree.
    pub max_depth: Option<usize>,
}

/// Node waiting on the worklist, with the label of its parent
enum Pending<C, D> {
    Collection { parent: String, depth: usize, node: C },
    Document { parent: String, depth: usize, node: D },
}

/// Pre-order walker over any [`DocumentStore`]
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    options: WalkOptions,
}

impl TreeWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Walk the store starting at `start`.
    ///
    /// The root path walks every root collection; a collection or document
    /// path walks that node and everything below it. Emitted paths are
    /// always absolute, so a walk started at `users/alice` emits
    /// `/users/alice` first.
    pub async fn walk<S: DocumentStore>(
        &self,
        store: &S,
        start: &NodePath,
        sink: &mut dyn VisitSink,
    ) -> Result<WalkSummary> {
        let parent = start.parent().map(|p| p.label()).unwrap_or_default();

        match start.kind() {
            None => {
                debug!("Listing root collections");
                let roots = store
                    .list_root_collections()
                    .await
                    .map_err(|e| FirestoreToolsError::ListRoots {
                        source: Box::new(e),
                    })?;
                self.walk_collections("", roots, sink).await
            }
            Some(NodeKind::Collection) => {
                let collection = store.collection(start)?;
                self.walk_collections(&parent, vec![collection], sink).await
            }
            Some(NodeKind::Document) => {
                let document = store.document(start)?;
                self.walk_documents(&parent, vec![document], sink).await
            }
        }
    }

    /// Walk a set of collections that all live under `parent`.
    pub async fn walk_collections<C, D>(
        &self,
        parent: &str,
        collections: Vec<C>,
        sink: &mut dyn VisitSink,
    ) -> Result<WalkSummary>
    where
        C: CollectionLike<Document = D>,
        D: DocumentLike<Collection = C>,
    {
        let stack = collections
            .into_iter()
            .rev()
            .map(|node| Pending::Collection {
                parent: parent.to_string(),
                depth: 1,
                node,
            })
            .collect();
        self.drain(stack, sink).await
    }

    /// Walk a set of documents that all live under `parent`.
    pub async fn walk_documents<C, D>(
        &self,
        parent: &str,
        documents: Vec<D>,
        sink: &mut dyn VisitSink,
    ) -> Result<WalkSummary>
    where
        C: CollectionLike<Document = D>,
        D: DocumentLike<Collection = C>,
    {
        let stack = documents
            .into_iter()
            .rev()
            .map(|node| Pending::Document {
                parent: parent.to_string(),
                depth: 1,
                node,
            })
            .collect();
        self.drain(stack, sink).await
    }

    async fn drain<C, D>(
        &self,
        mut stack: Vec<Pending<C, D>>,
        sink: &mut dyn VisitSink,
    ) -> Result<WalkSummary>
    where
        C: CollectionLike<Document = D>,
        D: DocumentLike<Collection = C>,
    {
        let mut summary = WalkSummary::default();
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(pending) = stack.pop() {
            match pending {
                Pending::Collection {
                    parent,
                    depth,
                    node,
                } => {
                    let Some(path) = self.enter(
                        NodeKind::Collection,
                        &parent,
                        node.id(),
                        depth,
                        &mut seen,
                        &mut summary,
                        sink,
                    )?
                    else {
                        continue;
                    };

                    debug!(path = %path, "Listing documents");
                    let documents = node.list_documents().await.map_err(|e| {
                        FirestoreToolsError::ListDocuments {
                            path: path.clone(),
                            source: Box::new(e),
                        }
                    })?;

                    for document in documents.into_iter().rev() {
                        stack.push(Pending::Document {
                            parent: path.clone(),
                            depth: depth + 1,
                            node: document,
                        });
                    }
                }
                Pending::Document {
                    parent,
                    depth,
                    node,
                } => {
                    let Some(path) = self.enter(
                        NodeKind::Document,
                        &parent,
                        node.id(),
                        depth,
                        &mut seen,
                        &mut summary,
                        sink,
                    )?
                    else {
                        continue;
                    };

                    debug!(path = %path, "Listing collections");
                    let collections = node.list_collections().await.map_err(|e| {
                        FirestoreToolsError::ListCollections {
                            path: path.clone(),
                            source: Box::new(e),
                        }
                    })?;

                    for collection in collections.into_iter().rev() {
                        stack.push(Pending::Collection {
                            parent: path.clone(),
                            depth: depth + 1,
                            node: collection,
                        });
                    }
                }
            }
        }

        debug!(
            collections = summary.collections,
            documents = summary.documents,
            skipped = summary.skipped,
            "Walk finished"
        );
        Ok(summary)
    }

    /// Emit a node. Returns its path when its children should be listed.
    #[allow(clippy::too_many_arguments)]
    fn enter(
        &self,
        kind: NodeKind,
        parent: &str,
        id: &str,
        depth: usize,
        seen: &mut HashSet<String>,
        summary: &mut WalkSummary,
        sink: &mut dyn VisitSink,
    ) -> Result<Option<String>> {
        let path = join_path(parent, id);

        if !seen.insert(path.clone()) {
            warn!(path = %path, "Skipping {} already visited", kind);
            summary.skipped += 1;
            return Ok(None);
        }

        sink.emit(&Visit {
            kind,
            id: id.to_string(),
            path: path.clone(),
            depth,
        })?;
        summary.record(kind);

        match self.options.max_depth {
            Some(max) if depth >= max => Ok(None),
            _ => Ok(Some(path)),
        }
    }
}
