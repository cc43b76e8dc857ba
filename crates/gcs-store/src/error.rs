use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read service file {}", path.display())]
    ServiceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed service file")]
    MalformedServiceFile(#[from] serde_json::Error),

    #[error("Invalid service account key")]
    SigningKey(#[source] jsonwebtoken::errors::Error),

    #[error("Failed to sign token assertion")]
    Assertion(#[source] jsonwebtoken::errors::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP request failed")]
    Http(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("{0} has been closed")]
    Closed(&'static str),
}

impl StoreError {
    /// Map a transport error, keeping timeouts distinct from other failures
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Http(err)
        }
    }

    /// Turn a non-success response into a `Status` error carrying the body
    pub(crate) async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status, body })
    }
}
