use std::future::Future;

use crate::store::Release;

/// Run `work` to completion, then release `resource` whatever the outcome.
pub async fn release_after<R, T, E, F>(resource: &R, work: F) -> Result<T, E>
where
    R: Release + ?Sized,
    F: Future<Output = Result<T, E>>,
{
    let result = work.await;
    resource.release();
    result
}
