//! Seams between the mirror steps and the storage client

use async_trait::async_trait;
use gcs_store::{ListParams, ObjectList, Storage, StoreResult, Token};
use std::path::Path;
use std::time::Duration;

/// A resource with an explicit release operation.
/// Releasing twice must be harmless.
pub trait Release {
    fn release(&self);
}

/// The storage operations the mirror needs
#[async_trait]
pub trait ObjectStore: Release + Send + Sync {
    async fn list_objects(
        &self,
        bucket: &str,
        params: &ListParams,
        timeout: Duration,
    ) -> StoreResult<ObjectList>;

    async fn download_to_filename(
        &self,
        bucket: &str,
        object_name: &str,
        destination: &Path,
    ) -> StoreResult<u64>;
}

impl Release for Token {
    fn release(&self) {
        self.close();
    }
}

impl Release for Storage {
    fn release(&self) {
        self.close();
    }
}

#[async_trait]
impl ObjectStore for Storage {
    async fn list_objects(
        &self,
        bucket: &str,
        params: &ListParams,
        timeout: Duration,
    ) -> StoreResult<ObjectList> {
        Storage::list_objects(self, bucket, params, timeout).await
    }

    async fn download_to_filename(
        &self,
        bucket: &str,
        object_name: &str,
        destination: &Path,
    ) -> StoreResult<u64> {
        Storage::download_to_filename(self, bucket, object_name, destination).await
    }
}
