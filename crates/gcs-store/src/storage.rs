//! Storage session: object listing and download-to-file

use futures_util::StreamExt;
use log::debug;
use reqwest::Client;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::credentials::Token;
use crate::error::{StoreError, StoreResult};
use crate::types::{ListParams, ObjectList};

pub const DEFAULT_API_ROOT: &str = "https://storage.googleapis.com";

/// Capacity of the `BufWriter` between the media stream and the file
const WRITE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Scheme and host of the JSON API, e.g. an emulator address
    pub api_root: String,
    /// Per-download timeout; `None` lets downloads run unbounded
    pub download_timeout: Option<Duration>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            download_timeout: None,
        }
    }
}

/// A storage session bound to a token. Safe to share between concurrent
/// requests; must be closed explicitly.
pub struct Storage {
    http: Client,
    token: Arc<Token>,
    config: StorageConfig,
    closed: AtomicBool,
}

impl Storage {
    pub fn new(token: Arc<Token>, config: StorageConfig) -> StoreResult<Self> {
        let http = Client::builder().build().map_err(StoreError::from_reqwest)?;
        Ok(Self {
            http,
            token,
            config,
            closed: AtomicBool::new(false),
        })
    }

    fn objects_url(&self, bucket: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o",
            self.config.api_root.trim_end_matches('/'),
            urlencoding::encode(bucket)
        )
    }

    async fn bearer(&self) -> StoreResult<String> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed("storage session"));
        }
        self.token.access_token().await
    }

    /// Fetch one page of `objects.list`. `timeout` bounds the whole call,
    /// including any token refresh it triggers.
    pub async fn list_objects(
        &self,
        bucket: &str,
        params: &ListParams,
        timeout: Duration,
    ) -> StoreResult<ObjectList> {
        tokio::time::timeout(timeout, self.list_page(bucket, params))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    async fn list_page(&self, bucket: &str, params: &ListParams) -> StoreResult<ObjectList> {
        let bearer = self.bearer().await?;

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(prefix) = params.prefix.as_deref() {
            query.push(("prefix", prefix));
        }
        if let Some(token) = params.page_token.as_deref() {
            query.push(("pageToken", token));
        }

        debug!(
            "objects.list bucket={} prefix={:?} page_token={:?}",
            bucket, params.prefix, params.page_token
        );

        let response = self
            .http
            .get(self.objects_url(bucket))
            .bearer_auth(bearer)
            .query(&query)
            .send()
            .await
            .map_err(StoreError::from_reqwest)?;
        let response = StoreError::check_status(response).await?;

        response.json().await.map_err(StoreError::from_reqwest)
    }

    /// Stream an object's media to `destination`, creating parent
    /// directories as needed. Returns the number of bytes written.
    pub async fn download_to_filename(
        &self,
        bucket: &str,
        object_name: &str,
        destination: &Path,
    ) -> StoreResult<u64> {
        let bearer = self.bearer().await?;
        let url = format!(
            "{}/{}",
            self.objects_url(bucket),
            urlencoding::encode(object_name)
        );

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(bearer)
            .query(&[("alt", "media")]);
        if let Some(timeout) = self.config.download_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(StoreError::from_reqwest)?;
        let response = StoreError::check_status(response).await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = File::create(destination).await?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(StoreError::from_reqwest)?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        // Ensure all data is written
        writer.flush().await?;

        debug!(
            "Downloaded gs://{}/{} -> {} ({} bytes)",
            bucket,
            object_name,
            destination.display(),
            written
        );

        Ok(written)
    }

    /// Release the session. Returns `true` only for the call that released it.
    pub fn close(&self) -> bool {
        let released = !self.closed.swap(true, Ordering::SeqCst);
        if released {
            debug!("Storage session closed");
        }
        released
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
