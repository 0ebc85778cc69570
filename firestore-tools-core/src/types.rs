//! Core types and data structures for document tree walking

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FirestoreToolsError, Result};

/// Kind of node in a document store hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A named grouping of documents
    Collection,
    /// A named node inside a collection, which may own sub-collections
    Document,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Collection => write!(f, "collection"),
            NodeKind::Document => write!(f, "document"),
        }
    }
}

/// A slash-separated location in the store.
///
/// Segments alternate between collection and document ids, so an odd number
/// of segments names a collection and an even, non-zero number names a
/// document. No segments at all is the database root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The database root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path such as `/users/alice/posts`.
    ///
    /// Leading and trailing slashes are ignored; empty inner segments are not.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(FirestoreToolsError::invalid_path(path, "empty segment"));
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Build a path directly from segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.iter().any(|s| s.is_empty() || s.contains('/')) {
            return Err(FirestoreToolsError::invalid_path(
                &segments.join("/"),
                "segments must be non-empty and must not contain '/'",
            ));
        }
        Ok(Self { segments })
    }

    /// Kind of node this path addresses, `None` for the root.
    pub fn kind(&self) -> Option<NodeKind> {
        match self.segments.len() {
            0 => None,
            n if n % 2 == 1 => Some(NodeKind::Collection),
            _ => Some(NodeKind::Document),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, i.e. the node id.
    pub fn id(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path of the enclosing node, `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Return a new path with `id` appended.
    pub fn child(&self, id: &str) -> NodePath {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Self { segments }
    }

    /// Label used in output: `/a/b/c`, or the empty string for the root.
    pub fn label(&self) -> String {
        self.segments
            .iter()
            .fold(String::new(), |acc, segment| join_path(&acc, segment))
    }

    /// Path without a leading slash, as used by REST resource names.
    pub fn relative(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.label())
        }
    }
}

impl std::str::FromStr for NodePath {
    type Err = FirestoreToolsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Join a parent label and a node id into a child label.
pub fn join_path(parent: &str, id: &str) -> String {
    format!("{}/{}", parent, id)
}

/// A single node emitted by the tree walker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Collection or document
    pub kind: NodeKind,
    /// Node id within its parent
    pub id: String,
    /// Full slash-joined path, e.g. `/users/alice`
    pub path: String,
    /// Depth relative to the walk start, starting at 1
    pub depth: usize,
}

/// Counters collected over one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub collections: usize,
    pub documents: usize,
    /// Nodes whose path had already been emitted
    pub skipped: usize,
}

impl WalkSummary {
    /// Number of emitted nodes.
    pub fn total(&self) -> usize {
        self.collections + self.documents
    }

    pub(crate) fn record(&mut self, kind: NodeKind) {
        match kind {
            NodeKind::Collection => self.collections += 1,
            NodeKind::Document => self.documents += 1,
        }
    }
}
