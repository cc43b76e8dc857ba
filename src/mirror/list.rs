//! Listing and the zero-byte filter

use gcs_store::{ListParams, ObjectEntry};
use log::{debug, info};

use super::LIST_TIMEOUT;
use crate::error::{MirrorError, MirrorResult};
use crate::store::ObjectStore;

/// List every object under `prefix`, following page tokens until the last page.
/// Any failure aborts the whole listing.
pub async fn list_objects<S>(store: &S, bucket: &str, prefix: &str) -> MirrorResult<Vec<ObjectEntry>>
where
    S: ObjectStore + ?Sized,
{
    let mut params = ListParams::with_prefix(prefix);
    let mut objects: Vec<ObjectEntry> = Vec::new();
    let mut page_count = 0;

    loop {
        let page = store
            .list_objects(bucket, &params, LIST_TIMEOUT)
            .await
            .map_err(|source| MirrorError::Listing {
                bucket: bucket.to_string(),
                source,
            })?;
        page_count += 1;
        debug!("Listing page {}: {} objects", page_count, page.items.len());

        objects.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => params.page_token = Some(token),
            _ => break,
        }
    }

    info!(
        "Listed {} objects under {}/{} in {} page(s)",
        objects.len(),
        bucket,
        prefix,
        page_count
    );
    Ok(objects)
}

/// Names of non-empty objects, in listing order
pub fn non_empty_names(objects: &[ObjectEntry]) -> Vec<String> {
    objects
        .iter()
        .filter(|obj| obj.size != 0)
        .map(|obj| obj.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{list_objects, non_empty_names};
    use crate::error::MirrorError;
    use crate::mirror::testing::{entries, FakeStore};
    use gcs_store::StoreError;

    #[tokio::test]
    async fn pages_are_concatenated_in_order() {
        let store = FakeStore::new(vec![
            entries(&[("a/1", 1), ("a/2", 2)]),
            entries(&[("a/3", 3)]),
            entries(&[("a/4", 4), ("a/5", 5)]),
        ]);

        let objects = list_objects(&store, "bucket", "a/").await.unwrap();
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();

        assert_eq!(names, vec!["a/1", "a/2", "a/3", "a/4", "a/5"]);

        let calls = store.list_calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|p| p.prefix.as_deref() == Some("a/")));
        assert_eq!(calls[0].page_token, None);
        assert_eq!(calls[1].page_token.as_deref(), Some("page-1"));
        assert_eq!(calls[2].page_token.as_deref(), Some("page-2"));
    }

    #[tokio::test]
    async fn duplicates_from_the_source_are_kept() {
        let store = FakeStore::new(vec![entries(&[("x", 1)]), entries(&[("x", 1)])]);
        let objects = list_objects(&store, "bucket", "").await.unwrap();
        assert_eq!(objects.len(), 2);
    }

    #[tokio::test]
    async fn failure_on_a_later_page_discards_the_partial_list() {
        let store = FakeStore::new(vec![
            entries(&[("a", 1)]),
            entries(&[("b", 1)]),
            entries(&[("c", 1)]),
        ])
        .fail_listing_at(1);

        let err = list_objects(&store, "bucket", "").await.unwrap_err();

        assert!(matches!(
            err,
            MirrorError::Listing {
                source: StoreError::Timeout,
                ..
            }
        ));
        assert_eq!(store.list_calls().len(), 2);
    }

    #[test]
    fn zero_byte_objects_are_dropped_wherever_they_appear() {
        let objects = entries(&[
            ("dir/", 0),
            ("dir/a", 10),
            ("dir/empty", 0),
            ("dir/b", 1),
            ("dir/last-empty", 0),
        ]);

        assert_eq!(non_empty_names(&objects), vec!["dir/a", "dir/b"]);
    }
}
