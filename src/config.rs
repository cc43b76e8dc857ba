//! Run configuration: CLI arguments plus a few environment overrides

use gcs_store::{StorageConfig, DEFAULT_API_ROOT};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::mirror::MirrorRequest;

/// Points the client at a storage emulator instead of the real API
pub const EMULATOR_HOST_ENV: &str = "STORAGE_EMULATOR_HOST";

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub bucket: String,
    pub prefix: String,
    pub service_file: PathBuf,
    pub api_root: String,
    /// Directory object keys are written under
    pub root: PathBuf,
}

impl MirrorConfig {
    pub fn from_env(cli: Cli) -> Self {
        Self::from_parts(cli, std::env::var(EMULATOR_HOST_ENV).ok())
    }

    pub fn from_parts(cli: Cli, emulator_host: Option<String>) -> Self {
        let api_root = emulator_host
            .map(|host| host.trim().trim_end_matches('/').to_string())
            .filter(|host| !host.is_empty())
            .map(|host| {
                if host.starts_with("http://") || host.starts_with("https://") {
                    host
                } else {
                    format!("http://{}", host)
                }
            })
            .unwrap_or_else(|| DEFAULT_API_ROOT.to_string());

        Self {
            bucket: cli.bucket_name,
            prefix: cli.prefix,
            service_file: cli.service_file,
            api_root,
            root: PathBuf::from("."),
        }
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            api_root: self.api_root.clone(),
            ..Default::default()
        }
    }

    pub fn request(&self) -> MirrorRequest {
        MirrorRequest {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            root: self.root.clone(),
        }
    }
}
