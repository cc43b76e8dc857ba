//! Paged concurrent downloads
//!
//! Names are split into pages of `PARALLEL_DOWNLOADS`. Pages run one after
//! another; the downloads of a page run concurrently on the current task.
//! A page always settles completely before its first error is returned, so
//! sibling downloads that already started are never cut off mid-write.
//! Keys that cannot be mapped inside the destination are logged and skipped.

use futures_util::future::join_all;
use log::{info, warn};
use std::path::{Component, Path, PathBuf};

use super::PARALLEL_DOWNLOADS;
use crate::error::{MirrorError, MirrorResult};
use crate::store::ObjectStore;

/// Create `root/prefix` (and parents). Existing directories are fine.
pub async fn ensure_destination(root: &Path, prefix: &str) -> MirrorResult<PathBuf> {
    let destination = root.join(prefix);
    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|source| MirrorError::Destination {
            path: destination.clone(),
            source,
        })?;
    Ok(destination)
}

/// Local path for an object key. Keys that are absolute or contain `..`
/// would land outside `root` and are rejected.
pub fn local_path(root: &Path, object_name: &str) -> MirrorResult<PathBuf> {
    let relative = Path::new(object_name);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || object_name.is_empty() {
        return Err(MirrorError::UnsafeObjectName(object_name.to_string()));
    }
    Ok(root.join(relative))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub pages: usize,
    pub downloaded: usize,
    /// Keys skipped because they would land outside `root`
    pub skipped_unsafe: Vec<String>,
}

/// Download every name under `root`, page by page.
pub async fn download_in_pages<S>(
    store: &S,
    bucket: &str,
    names: &[String],
    root: &Path,
    destination: &Path,
) -> MirrorResult<DownloadReport>
where
    S: ObjectStore + ?Sized,
{
    let mut report = DownloadReport::default();

    for page in names.chunks(PARALLEL_DOWNLOADS) {
        let mut targets = Vec::with_capacity(page.len());
        for name in page {
            match local_path(root, name) {
                Ok(path) => targets.push((name.as_str(), path)),
                Err(err) => {
                    warn!("Skipping {}: {}", name, err);
                    report.skipped_unsafe.push(name.clone());
                }
            }
        }

        println!("{}: {:?}", destination.display(), page);

        let results = join_all(targets.iter().map(|(name, path)| async move {
            store
                .download_to_filename(bucket, name, path)
                .await
                .map_err(|source| MirrorError::Download {
                    object: name.to_string(),
                    source,
                })
        }))
        .await;
        report.pages += 1;
        report.downloaded += results.iter().filter(|r| r.is_ok()).count();

        if let Some(err) = results.into_iter().find_map(Result::err) {
            warn!("Page {} failed, abandoning remaining pages: {}", report.pages, err);
            return Err(err);
        }
    }

    info!(
        "Downloaded {} objects in {} page(s), skipped {} unsafe key(s)",
        report.downloaded,
        report.pages,
        report.skipped_unsafe.len()
    );
    Ok(report)
}
