//! HTTP client for the Firestore REST API.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{Auth, ServiceAccountAuth, ServiceAccountKey};
use crate::config::CliConfig;

/// Production REST endpoint
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Normalize a base URL by removing trailing slashes.
fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Percent-encode each segment of a slash-separated path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Everything needed to open a connection
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Service-account key file; optional in emulator mode
    pub credential: PathBuf,
    /// Project id; taken from the key file when absent
    pub project: Option<String>,
    pub database: String,
    /// Emulator `host:port`; enables emulator mode
    pub emulator_host: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub page_size: u32,
}

impl ConnectionSettings {
    /// Derive settings from the resolved CLI configuration.
    pub fn from_config(config: &CliConfig, credential: impl Into<PathBuf>) -> Self {
        Self {
            credential: credential.into(),
            project: config.project.clone(),
            database: config.database.clone(),
            emulator_host: config.emulator_host.clone(),
            timeout: Duration::from_secs(config.timeout),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(500),
            page_size: config.page_size,
        }
    }
}

/// A document as returned by `documents.list`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Full resource name, `projects/p/databases/d/documents/...`
    pub name: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl RawDocument {
    /// Document id: the last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsRequest {
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsResponse {
    #[serde(default)]
    pub collection_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Firestore's error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Treat an empty page token the same as a missing one.
fn next_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// HTTP client for the Firestore REST API.
///
/// Handles:
/// - Service-account or emulator authorization
/// - Pagination of list calls
/// - Automatic retries on connection failures
/// - Mapping Firestore error bodies to readable messages
///
/// # Retry Logic
///
/// Requests that fail to reach the server (connection refused, timeout) are
/// retried with a delay that grows linearly with each attempt. HTTP error
/// statuses (4xx, 5xx) are returned immediately.
///
/// # Examples
///
/// ```no_run
/// use firestore_tools::client::{ConnectionSettings, FirestoreClient};
/// use firestore_tools::config::CliConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = ConnectionSettings::from_config(&CliConfig::default(), "credential.json");
/// let client = FirestoreClient::connect(&settings)?;
///
/// for id in client.list_collection_ids(None).await? {
///     println!("{}", id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project: String,
    database: String,
    auth: Auth,
    max_retries: u32,
    retry_delay: Duration,
    page_size: u32,
}

impl FirestoreClient {
    /// Create a client from connection settings.
    ///
    /// In emulator mode the credential file is optional and is only read
    /// for its project id. Otherwise it must be a service-account key.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP client cannot be created
    /// - The credential file is missing or malformed (outside emulator mode)
    /// - No project id can be determined
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("firestore-tools/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        let (base_url, auth, key_project) = match &settings.emulator_host {
            Some(host) => {
                let key_project = ServiceAccountKey::from_file(&settings.credential)
                    .ok()
                    .and_then(|key| key.project_id);
                let host = host
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                (format!("http://{}/v1", host), Auth::Emulator, key_project)
            }
            None => {
                let key = ServiceAccountKey::from_file(&settings.credential)?;
                let key_project = key.project_id.clone();
                let auth = Auth::ServiceAccount(ServiceAccountAuth::new(key, client.clone()));
                (FIRESTORE_BASE_URL.to_string(), auth, key_project)
            }
        };

        let project = settings
            .project
            .clone()
            .or(key_project)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No project id: set --project, FIRESTORE_TOOLS_PROJECT or use a credential file with project_id"
                )
            })?;

        Self::with_base_url(base_url, project, settings, auth, client)
    }

    /// Create a client against an explicit base URL (e.g. `http://host/v1`).
    pub fn with_base_url(
        base_url: impl AsRef<str>,
        project: impl Into<String>,
        settings: &ConnectionSettings,
        auth: Auth,
        client: Client,
    ) -> Result<Self> {
        let project = project.into();
        if project.trim().is_empty() || project.contains('/') {
            return Err(anyhow::anyhow!("Invalid project id '{}'", project));
        }

        Ok(Self {
            client,
            base_url: normalize_url(base_url.as_ref()),
            project,
            database: settings.database.clone(),
            auth,
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay,
            page_size: settings.page_size,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_emulator(&self) -> bool {
        matches!(self.auth, Auth::Emulator)
    }

    /// `projects/<p>/databases/<d>/documents`
    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url,
            urlencoding::encode(&self.project),
            urlencoding::encode(&self.database)
        )
    }

    /// Process an HTTP response and deserialize its body.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP status code indicates failure (4xx or 5xx)
    /// - The response body cannot be read
    /// - The JSON cannot be deserialized
    async fn handle_response<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", endpoint))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| {
                    if e.error.status.is_empty() {
                        e.error.message
                    } else {
                        format!("{} ({})", e.error.message, e.error.status)
                    }
                })
                .unwrap_or(text);
            let error_msg = match status {
                StatusCode::NOT_FOUND => format!("{} not found: {}", endpoint, detail),
                StatusCode::BAD_REQUEST => format!("Bad request to {}: {}", endpoint, detail),
                StatusCode::UNAUTHORIZED => format!("Unauthorized access to {}: {}", endpoint, detail),
                StatusCode::FORBIDDEN => format!("Access forbidden to {}: {}", endpoint, detail),
                StatusCode::SERVICE_UNAVAILABLE => {
                    format!("Service unavailable at {}: {}", endpoint, detail)
                }
                _ => format!("HTTP {} error at {}: {}", status, endpoint, detail),
            };
            return Err(anyhow::anyhow!(error_msg));
        }

        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response from {}", endpoint))
    }

    /// Execute an authorized HTTP request with automatic retry logic.
    ///
    /// Only connection-related errors are retried, with delay
    /// `retry_delay * (attempt + 1)`.
    async fn execute_with_retry<F, T>(&self, endpoint: &str, request_fn: F) -> Result<T>
    where
        F: Fn() -> RequestBuilder,
        T: DeserializeOwned,
    {
        let token = self.auth.bearer().await?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            debug!(endpoint, attempt, "Sending request");
            match request_fn().bearer_auth(&token).send().await {
                Ok(response) => {
                    return Self::handle_response(response, endpoint).await;
                }
                Err(e) => {
                    let should_retry = e.is_connect() || e.is_timeout() || e.is_request();

                    // Don't retry on the last attempt
                    if attempt < self.max_retries && should_retry {
                        warn!(endpoint, attempt, error = %e, "Request failed, retrying");
                        last_error = Some(e);
                        tokio::time::sleep(self.retry_delay * (attempt + 1)).await;
                        continue;
                    }
                    last_error = Some(e);
                    break;
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        Err(anyhow::anyhow!(
            "Failed to reach {} after {} attempts: {}",
            endpoint,
            self.max_retries + 1,
            reason
        ))
    }

    /// List collection ids under a document, or the root collections when
    /// `parent` is `None`. Follows pagination to the end.
    ///
    /// # Arguments
    ///
    /// * `parent` - Document path relative to the database, e.g. `users/alice`
    pub async fn list_collection_ids(&self, parent: Option<&str>) -> Result<Vec<String>> {
        let url = match parent {
            Some(path) => format!(
                "{}/{}:listCollectionIds",
                self.documents_root(),
                encode_path(path)
            ),
            None => format!("{}:listCollectionIds", self.documents_root()),
        };
        let endpoint = match parent {
            Some(path) => format!("{}:listCollectionIds", path),
            None => ":listCollectionIds".to_string(),
        };

        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let body = ListCollectionIdsRequest {
                page_size: self.page_size,
                page_token: page_token.clone(),
            };
            let page: ListCollectionIdsResponse = self
                .execute_with_retry(&endpoint, || self.client.post(&url).json(&body))
                .await?;

            ids.extend(page.collection_ids);
            page_token = next_token(page.next_page_token);
            if page_token.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    /// List the documents of a collection. Follows pagination to the end.
    ///
    /// Only document names are requested (`mask.fieldPaths=__name__`).
    /// Missing documents, which exist only as parents of sub-collections,
    /// are not returned.
    ///
    /// # Arguments
    ///
    /// * `collection` - Collection path relative to the database, e.g. `users`
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<RawDocument>> {
        if collection.trim().is_empty() {
            return Err(anyhow::anyhow!("Collection path cannot be empty"));
        }

        let url = format!("{}/{}", self.documents_root(), encode_path(collection));
        let endpoint = collection.to_string();

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("pageSize", self.page_size.to_string()),
                ("mask.fieldPaths", "__name__".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: ListDocumentsResponse = self
                .execute_with_retry(&endpoint, || self.client.get(&url).query(&query))
                .await?;

            documents.extend(page.documents);
            page_token = next_token(page.next_page_token);
            if page_token.is_none() {
                break;
            }
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockFirestore;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            credential: PathBuf::from("/nonexistent/credential.json"),
            project: Some("demo".to_string()),
            database: "(default)".to_string(),
            emulator_host: None,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_delay: Duration::from_millis(10),
            page_size: 2,
        }
    }

    async fn emulator_client(mock: MockFirestore) -> (MockFirestore, FirestoreClient) {
        let (mock, host) = mock.start().await.unwrap();
        let mut settings = settings();
        settings.emulator_host = Some(host);
        let client = FirestoreClient::connect(&settings).unwrap();
        (mock, client)
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("http://localhost:8080/v1/"),
            "http://localhost:8080/v1"
        );
        assert_eq!(
            normalize_url("https://firestore.googleapis.com/v1"),
            "https://firestore.googleapis.com/v1"
        );
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("users/alice"), "users/alice");
        assert_eq!(encode_path("my docs/a&b"), "my%20docs/a%26b");
    }

    #[test]
    fn test_raw_document_id() {
        let doc = RawDocument {
            name: "projects/p/databases/(default)/documents/users/alice".to_string(),
            fields: Default::default(),
            create_time: None,
            update_time: None,
        };
        assert_eq!(doc.id(), "alice");
    }

    #[test]
    fn test_next_token() {
        assert_eq!(next_token(None), None);
        assert_eq!(next_token(Some(String::new())), None);
        assert_eq!(next_token(Some("2".to_string())), Some("2".to_string()));
    }

    #[test]
    fn test_connect_requires_credentials_outside_emulator() {
        let err = FirestoreClient::connect(&settings()).unwrap_err();
        assert!(err.to_string().contains("credential"));
    }

    #[test]
    fn test_connect_requires_project() {
        let mut settings = settings();
        settings.project = None;
        settings.emulator_host = Some("localhost:8080".to_string());
        let err = FirestoreClient::connect(&settings).unwrap_err();
        assert!(err.to_string().contains("No project id"));
    }

    #[test]
    fn test_connect_emulator() {
        let mut settings = settings();
        settings.emulator_host = Some("http://localhost:8080/".to_string());
        let client = FirestoreClient::connect(&settings).unwrap();
        assert!(client.is_emulator());
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
        assert_eq!(client.project(), "demo");
    }

    #[tokio::test]
    async fn test_list_root_collections_paginates() {
        let mock = MockFirestore::new()
            .with_document("users/alice")
            .with_document("orders/o1")
            .with_document("audit/a1");
        let (mock, client) = emulator_client(mock).await;

        let ids = client.list_collection_ids(None).await.unwrap();
        assert_eq!(ids, vec!["audit", "orders", "users"]);
        // page size 2 -> two requests
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_list_documents_paginates() {
        let mock = MockFirestore::new()
            .with_document("users/alice")
            .with_document("users/bob")
            .with_document("users/carol");
        let (_mock, client) = emulator_client(mock).await;

        let docs = client.list_documents("users").await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_list_documents_requests_names_only() {
        let mock = MockFirestore::new().with_document("users/alice");
        let (_mock, client) = emulator_client(mock).await;

        let docs = client.list_documents("users").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].fields.is_empty(), "{:?}", docs[0].fields);
    }

    #[tokio::test]
    async fn test_list_subcollections_with_spaces() {
        let mock = MockFirestore::new().with_document("my users/alice smith/saved posts/p1");
        let (_mock, client) = emulator_client(mock).await;

        let ids = client
            .list_collection_ids(Some("my users/alice smith"))
            .await
            .unwrap();
        assert_eq!(ids, vec!["saved posts"]);

        let docs = client
            .list_documents("my users/alice smith/saved posts")
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), "p1");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mock = MockFirestore::new()
            .with_document("users/alice")
            .with_failure("users");
        let (_mock, client) = emulator_client(mock).await;

        let err = client.list_documents("users").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Access forbidden to users"), "{}", message);
        assert!(message.contains("PERMISSION_DENIED"), "{}", message);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let mut settings = settings();
        // Port 9 (discard) is almost never listening
        settings.emulator_host = Some("127.0.0.1:9".to_string());
        settings.max_retries = 1;
        let client = FirestoreClient::connect(&settings).unwrap();

        let err = client.list_collection_ids(None).await.unwrap_err();
        assert!(err.to_string().contains("after 2 attempts"), "{}", err);
    }
}
