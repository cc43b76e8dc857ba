//! In-memory store used by the mirror tests

use async_trait::async_trait;
use gcs_store::{ListParams, ObjectEntry, ObjectList, StoreError, StoreResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::store::{ObjectStore, Release};

pub(crate) fn entries(items: &[(&str, u64)]) -> Vec<ObjectEntry> {
    items
        .iter()
        .map(|(name, size)| ObjectEntry {
            name: name.to_string(),
            size: *size,
        })
        .collect()
}

#[derive(Default)]
struct FakeState {
    pages: Vec<Vec<ObjectEntry>>,
    fail_listing_at: Option<usize>,
    fail_download_of: Option<String>,
    list_calls: Mutex<Vec<ListParams>>,
    // (object name, downloads finished when it started)
    started: Mutex<Vec<(String, usize)>>,
    destinations: Mutex<Vec<PathBuf>>,
    finished: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    releases: AtomicUsize,
}

/// Cheap handle; clones share state so tests can inspect what a session did.
#[derive(Clone, Default)]
pub(crate) struct FakeStore(Arc<FakeState>);

impl FakeStore {
    pub fn new(pages: Vec<Vec<ObjectEntry>>) -> Self {
        Self(Arc::new(FakeState {
            pages,
            ..Default::default()
        }))
    }

    fn state_mut(&mut self) -> &mut FakeState {
        Arc::get_mut(&mut self.0).expect("configure the fake before sharing it")
    }

    pub fn fail_listing_at(mut self, page: usize) -> Self {
        self.state_mut().fail_listing_at = Some(page);
        self
    }

    pub fn fail_download_of(mut self, name: &str) -> Self {
        self.state_mut().fail_download_of = Some(name.to_string());
        self
    }

    pub fn list_calls(&self) -> Vec<ListParams> {
        self.0.list_calls.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<(String, usize)> {
        self.0.started.lock().unwrap().clone()
    }

    pub fn started_names(&self) -> Vec<String> {
        self.started().into_iter().map(|(name, _)| name).collect()
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.0.destinations.lock().unwrap().clone()
    }

    pub fn finished(&self) -> usize {
        self.0.finished.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.0.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.0.releases.load(Ordering::SeqCst)
    }

    /// Downloads grouped by how many had finished when they started.
    /// Concurrent siblings share that count, so each group is one page.
    pub fn page_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<(usize, usize)> = Vec::new();
        for (_, finished) in self.started() {
            match sizes.last_mut() {
                Some((mark, size)) if *mark == finished => *size += 1,
                _ => sizes.push((finished, 1)),
            }
        }
        sizes.into_iter().map(|(_, size)| size).collect()
    }
}

impl Release for FakeStore {
    fn release(&self) {
        self.0.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn list_objects(
        &self,
        _bucket: &str,
        params: &ListParams,
        _timeout: Duration,
    ) -> StoreResult<ObjectList> {
        self.0.list_calls.lock().unwrap().push(params.clone());

        let index = params
            .page_token
            .as_deref()
            .and_then(|t| t.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);

        if self.0.fail_listing_at == Some(index) {
            return Err(StoreError::Timeout);
        }

        let items = self.0.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < self.0.pages.len()).then(|| format!("page-{}", index + 1));
        Ok(ObjectList {
            items,
            next_page_token,
        })
    }

    async fn download_to_filename(
        &self,
        _bucket: &str,
        object_name: &str,
        destination: &Path,
    ) -> StoreResult<u64> {
        let state = &self.0;
        state
            .started
            .lock()
            .unwrap()
            .push((object_name.to_string(), state.finished.load(Ordering::SeqCst)));
        state
            .destinations
            .lock()
            .unwrap()
            .push(destination.to_path_buf());

        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Let siblings in the same page start before this one finishes.
        tokio::task::yield_now().await;

        state.in_flight.fetch_sub(1, Ordering::SeqCst);
        state.finished.fetch_add(1, Ordering::SeqCst);

        if state.fail_download_of.as_deref() == Some(object_name) {
            return Err(StoreError::Status {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        Ok(1)
    }
}

/// Credential stand-in that counts releases
#[derive(Default)]
pub(crate) struct FakeCredential(AtomicUsize);

impl FakeCredential {
    pub fn releases(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Release for FakeCredential {
    fn release(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
