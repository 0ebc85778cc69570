//! Test utilities for CLI testing
//!
//! Provides a mock Firestore REST server that answers the two list calls
//! the reader makes, with paging and per-path failure injection. Like the
//! real emulator it only serves requests carrying `Authorization: Bearer owner`.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::client::{
    ListCollectionIdsRequest, ListCollectionIdsResponse, ListDocumentsResponse, RawDocument,
};

/// Mock server state
#[derive(Debug, Clone, Default)]
pub struct MockFirestoreState {
    /// Every known node path, relative to the database
    nodes: Arc<BTreeSet<String>>,
    /// Paths whose listing answers 403
    failures: Arc<HashSet<String>>,
    /// Number of list requests served
    requests: Arc<AtomicUsize>,
}

impl MockFirestoreState {
    /// Ids of the direct children of `parent` ("" for the root), sorted.
    fn children(&self, parent: &str) -> Vec<String> {
        let depth = if parent.is_empty() {
            1
        } else {
            parent.split('/').count() + 1
        };
        let prefix = if parent.is_empty() {
            String::new()
        } else {
            format!("{}/", parent)
        };

        self.nodes
            .iter()
            .filter(|node| node.starts_with(&prefix) && node.split('/').count() == depth)
            .filter_map(|node| node.rsplit('/').next().map(str::to_string))
            .collect()
    }
}

/// Mock Firestore server
#[derive(Debug, Default)]
pub struct MockFirestore {
    nodes: BTreeSet<String>,
    failures: HashSet<String>,
    requests: Arc<AtomicUsize>,
    port: u16,
}

impl MockFirestore {
    /// Create an empty mock database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document and every collection and document above it.
    ///
    /// `with_document("A/b/C/d")` creates `A`, `A/b`, `A/b/C` and `A/b/C/d`.
    pub fn with_document(mut self, path: &str) -> Self {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        for end in 1..=segments.len() {
            self.nodes.insert(segments[..end].join("/"));
        }
        self
    }

    /// Make every list call targeting `path` fail with PERMISSION_DENIED.
    pub fn with_failure(mut self, path: &str) -> Self {
        self.failures.insert(path.trim_matches('/').to_string());
        self
    }

    /// Start the mock server and return its base URL (`http://127.0.0.1:port`)
    pub async fn start(mut self) -> Result<(Self, String)> {
        let state = MockFirestoreState {
            nodes: Arc::new(self.nodes.clone()),
            failures: Arc::new(self.failures.clone()),
            requests: Arc::clone(&self.requests),
        };
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        self.port = addr.port();

        let server_url = format!("http://127.0.0.1:{}", self.port);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Ok((self, server_url))
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Number of list requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn create_router(state: MockFirestoreState) -> Router {
    Router::new()
        .route(
            "/v1/*rest",
            get(list_documents_handler).post(list_collection_ids_handler),
        )
        .with_state(state)
}

/// Split `projects/p/databases/d/documents/<path>` into the resource
/// prefix and the node path.
fn split_resource(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim_start_matches('/');
    let parts: Vec<&str> = rest.splitn(6, '/').collect();
    match parts.as_slice() {
        ["projects", project, "databases", database, "documents", tail @ ..] => {
            let prefix = format!("projects/{}/databases/{}/documents", project, database);
            // The root listCollectionIds call has no path after `documents`
            let path = tail.first().map(|p| p.to_string()).unwrap_or_default();
            Some((prefix, path))
        }
        _ => None,
    }
}

fn error_response(status: StatusCode, state_name: &str, message: String) -> Response {
    let body = serde_json::json!({
        "error": {
            "code": status.as_u16(),
            "message": message,
            "status": state_name,
        }
    });
    (status, Json(body)).into_response()
}

/// Reject requests that do not carry the emulator's `owner` bearer.
fn check_bearer(headers: &HeaderMap) -> Option<Response> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if bearer == Some("Bearer owner") {
        return None;
    }
    Some(error_response(
        StatusCode::UNAUTHORIZED,
        "UNAUTHENTICATED",
        "Request is missing the owner bearer.".to_string(),
    ))
}

/// Take one page from `items`, using the offset as page token.
fn page<T: Clone>(items: &[T], size: u32, token: Option<&str>) -> (Vec<T>, Option<String>) {
    let start = token.and_then(|t| t.parse().ok()).unwrap_or(0usize);
    let end = (start + size.max(1) as usize).min(items.len());
    let slice = items.get(start..end).unwrap_or_default().to_vec();
    let next = (end < items.len()).then(|| end.to_string());
    (slice, next)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsQuery {
    page_size: Option<u32>,
    page_token: Option<String>,
    #[serde(rename = "mask.fieldPaths")]
    mask: Option<String>,
}

async fn list_documents_handler(
    State(state): State<MockFirestoreState>,
    Path(rest): Path<String>,
    Query(query): Query<ListDocumentsQuery>,
    headers: HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if let Some(rejection) = check_bearer(&headers) {
        return rejection;
    }

    let Some((prefix, path)) = split_resource(&rest) else {
        return error_response(StatusCode::NOT_FOUND, "NOT_FOUND", format!("No route {}", rest));
    };
    if path.is_empty() || path.split('/').count() % 2 == 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_ARGUMENT",
            format!("'{}' is not a collection", path),
        );
    }
    if state.failures.contains(&path) {
        return error_response(
            StatusCode::FORBIDDEN,
            "PERMISSION_DENIED",
            "Missing or insufficient permissions.".to_string(),
        );
    }

    let ids = state.children(&path);
    let (ids, next_page_token) = page(
        &ids,
        query.page_size.unwrap_or(300),
        query.page_token.as_deref(),
    );
    let names_only = query.mask.as_deref() == Some("__name__");
    let documents = ids
        .into_iter()
        .map(|id| {
            let mut fields = serde_json::Map::new();
            if !names_only {
                fields.insert("id".to_string(), serde_json::json!({ "stringValue": id }));
            }
            RawDocument {
                name: format!("{}/{}/{}", prefix, path, id),
                fields,
                create_time: None,
                update_time: None,
            }
        })
        .collect();

    Json(ListDocumentsResponse {
        documents,
        next_page_token,
    })
    .into_response()
}

async fn list_collection_ids_handler(
    State(state): State<MockFirestoreState>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ListCollectionIdsRequest>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if let Some(rejection) = check_bearer(&headers) {
        return rejection;
    }

    let Some(rest) = rest.strip_suffix(":listCollectionIds") else {
        return error_response(StatusCode::NOT_FOUND, "NOT_FOUND", format!("No route {}", rest));
    };
    let Some((_, path)) = split_resource(rest) else {
        return error_response(StatusCode::NOT_FOUND, "NOT_FOUND", format!("No route {}", rest));
    };
    if !path.is_empty() && path.split('/').count() % 2 == 1 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_ARGUMENT",
            format!("'{}' is not a document", path),
        );
    }
    if state.failures.contains(&path) {
        return error_response(
            StatusCode::FORBIDDEN,
            "PERMISSION_DENIED",
            "Missing or insufficient permissions.".to_string(),
        );
    }

    let ids = state.children(&path);
    let (collection_ids, next_page_token) =
        page(&ids, request.page_size, request.page_token.as_deref());

    Json(ListCollectionIdsResponse {
        collection_ids,
        next_page_token,
    })
    .into_response()
}
