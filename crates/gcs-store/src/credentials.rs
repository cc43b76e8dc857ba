//! Service account credentials
//!
//! A `Token` is built from a service account JSON key and a set of scopes.
//! Access tokens are obtained with the OAuth2 JWT bearer grant against the
//! key's `token_uri`, cached, and refreshed shortly before they expire.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};

pub const READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform.read-only";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime requested for each signed assertion (seconds)
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh tokens this many seconds before they expire
const REFRESH_MARGIN_SECS: i64 = 60;
/// Upper bound on a single token exchange
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The fields of a service account key file this client needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct Token {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    scope: String,
    http: Client,
    cached: Mutex<Option<AccessToken>>,
    closed: AtomicBool,
}

impl Token {
    /// Load a service account key file. No network activity happens here.
    pub fn from_service_file(path: impl AsRef<Path>, scopes: &[&str]) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::ServiceFile {
            path: path.to_path_buf(),
            source,
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)?;
        Self::from_key(key, scopes)
    }

    pub fn from_key(key: ServiceAccountKey, scopes: &[&str]) -> StoreResult<Self> {
        let signing_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(StoreError::SigningKey)?;
        let http = Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(StoreError::from_reqwest)?;

        debug!("Loaded service account {}", key.client_email);

        Ok(Self {
            key,
            signing_key,
            scope: scopes.join(" "),
            http,
            cached: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Return a valid access token, fetching a new one if needed.
    /// Concurrent callers wait on the same refresh.
    pub async fn access_token(&self) -> StoreResult<String> {
        if self.is_closed() {
            return Err(StoreError::Closed("token"));
        }

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_access_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_access_token(&self) -> StoreResult<AccessToken> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let assertion =
            encode(&header, &claims, &self.signing_key).map_err(StoreError::Assertion)?;

        debug!("Requesting access token from {}", self.key.token_uri);

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(StoreError::from_reqwest)?;
        let response = StoreError::check_status(response).await?;
        let body: TokenResponse = response.json().await.map_err(StoreError::from_reqwest)?;

        let expires_in = body.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        info!(
            "Obtained access token for {} (expires in {}s)",
            self.key.client_email, expires_in
        );

        Ok(AccessToken {
            value: body.access_token,
            expires_at: now + ChronoDuration::seconds(expires_in),
        })
    }

    /// Release the token. Returns `true` only for the call that released it.
    pub fn close(&self) -> bool {
        let released = !self.closed.swap(true, Ordering::SeqCst);
        if released {
            if let Ok(mut cached) = self.cached.try_lock() {
                cached.take();
            }
            debug!("Token for {} closed", self.key.client_email);
        }
        released
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
