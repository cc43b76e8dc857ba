//! Mirror a Cloud Storage bucket prefix to a local directory tree

pub mod cli;
pub mod config;
pub mod error;
pub mod mirror;
pub mod store;

use gcs_store::{Storage, Token, READ_ONLY_SCOPE};
use std::sync::Arc;

use config::MirrorConfig;
use error::{MirrorError, MirrorResult};
use mirror::{MirrorOptions, MirrorSummary};

/// Authenticate, list, filter and download according to `config`.
/// The credential is loaded before any network activity.
pub async fn run(config: &MirrorConfig, options: &MirrorOptions) -> MirrorResult<MirrorSummary> {
    let token = Token::from_service_file(&config.service_file, &[READ_ONLY_SCOPE])
        .map_err(MirrorError::Credentials)?;
    let token = Arc::new(token);
    let storage_config = config.storage_config();

    mirror::mirror(
        token.as_ref(),
        || Storage::new(token.clone(), storage_config.clone()).map_err(MirrorError::Session),
        &config.request(),
        options,
    )
    .await
}
