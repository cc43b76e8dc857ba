use gcs_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

pub type MirrorResult<T> = Result<T, MirrorError>;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Failed to load credentials")]
    Credentials(#[source] StoreError),

    #[error("Failed to open storage session")]
    Session(#[source] StoreError),

    #[error("Failed to list objects in bucket {bucket}")]
    Listing {
        bucket: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to create destination directory {}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object name {0:?} escapes the destination directory")]
    UnsafeObjectName(String),

    #[error("Failed to download {object}")]
    Download {
        object: String,
        #[source]
        source: StoreError,
    },
}
