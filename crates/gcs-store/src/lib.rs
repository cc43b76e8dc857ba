//! Cloud Storage JSON API client
//!
//! This crate is organized into modules:
//! - `credentials`: Service account tokens (JWT bearer grant)
//! - `storage`: Object listing and download-to-file
//! - `types`: Wire types for listing responses
//! - `error`: Error type shared by all operations

mod credentials;
mod error;
mod storage;
mod types;

pub use credentials::{ServiceAccountKey, Token, READ_ONLY_SCOPE};
pub use error::{StoreError, StoreResult};
pub use storage::{Storage, StorageConfig, DEFAULT_API_ROOT};
pub use types::{ListParams, ObjectEntry, ObjectList};
