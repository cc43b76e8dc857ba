//! Mirror module - list a bucket prefix and download it to local files
//!
//! This module is organized into submodules:
//! - `list`: Paginated listing and the zero-byte filter
//! - `download`: Paged concurrent downloads
//! - `scope`: Release of credentials and sessions on every exit path

mod download;
mod list;
mod scope;
#[cfg(test)]
pub(crate) mod testing;

use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MirrorError, MirrorResult};
use crate::store::{ObjectStore, Release};

pub use download::{download_in_pages, ensure_destination, local_path, DownloadReport};
pub use list::{list_objects, non_empty_names};
pub use scope::release_after;

/// Maximum downloads in flight; also the page size
pub const PARALLEL_DOWNLOADS: usize = 5;

/// Timeout for each listing call
pub const LIST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorOptions {
    pub verbose: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self { verbose: true }
    }
}

/// What to mirror and where
#[derive(Debug, Clone)]
pub struct MirrorRequest {
    pub bucket: String,
    pub prefix: String,
    /// Directory object keys are resolved against
    pub root: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub listed: usize,
    pub skipped_empty: usize,
    pub downloaded: usize,
    pub skipped_unsafe: usize,
    pub pages: usize,
}

/// Run one mirror pass.
///
/// `open_session` is called once for listing and once for downloading; each
/// session is released when its step ends, and `credential` is released when
/// the whole pass ends, whether it succeeded or not.
pub async fn mirror<C, S, F>(
    credential: &C,
    open_session: F,
    request: &MirrorRequest,
    options: &MirrorOptions,
) -> MirrorResult<MirrorSummary>
where
    C: Release + ?Sized,
    S: ObjectStore,
    F: Fn() -> MirrorResult<S>,
{
    release_after(credential, async {
        let listing = open_session()?;
        let objects = release_after(
            &listing,
            list_objects(&listing, &request.bucket, &request.prefix),
        )
        .await?;

        let names = non_empty_names(&objects);
        if options.verbose {
            println!(
                "Downloading {} non-zero objects from bucket {}/{}...",
                names.len(),
                request.bucket,
                request.prefix
            );
        }

        let downloads = open_session()?;
        let report = release_after(&downloads, async {
            let destination = ensure_destination(&request.root, &request.prefix).await?;
            download_in_pages(&downloads, &request.bucket, &names, &request.root, &destination)
                .await
        })
        .await?;

        let summary = MirrorSummary {
            listed: objects.len(),
            skipped_empty: objects.len() - names.len(),
            downloaded: report.downloaded,
            skipped_unsafe: report.skipped_unsafe.len(),
            pages: report.pages,
        };
        info!(
            "Mirrored {}/{}: {} listed, {} empty skipped, {} unsafe skipped, {} downloaded in {} page(s)",
            request.bucket,
            request.prefix,
            summary.listed,
            summary.skipped_empty,
            summary.skipped_unsafe,
            summary.downloaded,
            summary.pages
        );
        Ok::<_, MirrorError>(summary)
    })
    .await
}
