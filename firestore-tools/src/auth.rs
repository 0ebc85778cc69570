//! Service-account authentication for the Firestore REST API
//!
//! Exchanges an RS256-signed JWT for an OAuth access token and caches the
//! token until shortly before it expires. The emulator needs no token
//! exchange and always receives the `owner` bearer, which bypasses
//! security rules.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// OAuth scope granting Firestore access
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Errors raised while loading credentials or obtaining tokens
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Cannot read credential file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to sign token assertion: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),

    #[error("Token exchange with {uri} failed: {message}")]
    Exchange { uri: String, message: String },
}

/// The fields of a Google service-account key file that are used here
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Read and parse a key file.
    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| CredentialError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// JWT claims for the bearer grant
#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// Access token source backed by a service-account key
#[derive(Debug)]
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Return a valid access token, exchanging a new assertion if needed.
    pub async fn access_token(&self) -> Result<String, CredentialError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.token.clone());
            }
        }

        let token = self.exchange().await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn signed_assertion(&self, issued_at: u64) -> Result<String, CredentialError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.key.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }

    async fn exchange(&self) -> Result<CachedToken, CredentialError> {
        let uri = self.key.token_uri.clone();
        let exchange_error = |message: String| CredentialError::Exchange {
            uri: uri.clone(),
            message,
        };

        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let assertion = self.signed_assertion(issued_at)?;

        debug!(client = %self.key.client_email, "Requesting access token");
        let started = Instant::now();
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| exchange_error(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| exchange_error(e.to_string()))?;
        if !status.is_success() {
            return Err(exchange_error(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| exchange_error(e.to_string()))?;

        Ok(CachedToken {
            token: token.access_token,
            expires_at: started + Duration::from_secs(token.expires_in),
        })
    }
}

/// How requests are authorized
#[derive(Debug)]
pub enum Auth {
    /// Local emulator: fixed `owner` bearer
    Emulator,
    /// Production: OAuth token from a service-account key
    ServiceAccount(ServiceAccountAuth),
}

impl Auth {
    /// Bearer token for the next request.
    pub async fn bearer(&self) -> Result<String, CredentialError> {
        match self {
            Auth::Emulator => Ok("owner".to_string()),
            Auth::ServiceAccount(auth) => auth.access_token().await,
        }
    }
}
