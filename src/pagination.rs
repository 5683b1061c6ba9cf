use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{error::Result, parallel};

/// Largest page size the Spotify Web API accepts for listing endpoints.
pub const MAX_PAGE_SIZE: usize = 50;

/// More concurrent page requests than this start running into upstream throttling.
pub const DEFAULT_PAGE_CONCURRENCY: usize = 6;

/// One page of an offset paginated collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub total: usize,
    pub items: Vec<T>,
}

/// Fetches every item of a paginated collection.
///
/// The first page is requested on its own to learn the total; the remaining
/// pages are then fetched concurrently through [`parallel::run_all`], each call
/// receiving `(cancel, limit, offset)`. Items come back in no particular order.
///
/// # Arguments
///
/// * `cancel` - stops outstanding page requests
/// * `page_size` - items requested per page (values below 1 mean 1)
/// * `concurrency` - maximum page requests in flight
/// * `fetch` - requests one page given `(cancel, limit, offset)`
///
/// # Errors
///
/// The first page error fails the whole listing, see [`parallel::run_all`].
///
/// # Example
///
/// ```
/// let tracks = pagination::get_all(&cancel, MAX_PAGE_SIZE, 6, move |cancel, limit, offset| {
///     let client = client.clone();
///     async move {
///         client
///             .get_playlist_tracks(&cancel, "37i9dQZF1DXcBWIGoYBM5M", limit, offset)
///             .await
///     }
/// })
/// .await?;
/// ```
pub async fn get_all<T, F, Fut>(
    cancel: &CancellationToken,
    page_size: usize,
    concurrency: usize,
    fetch: F,
) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(CancellationToken, usize, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    let page_size = page_size.max(1);
    let first = fetch(cancel.clone(), page_size, 0).await?;
    let total = first.total;

    if total <= page_size {
        return Ok(first.items);
    }

    // total comes from the server, so it never sizes an allocation
    let items = Arc::new(Mutex::new(first.items));

    // page 0 is already loaded
    let remaining_pages = total.div_ceil(page_size) - 1;

    let collected = Arc::clone(&items);
    parallel::run_all(cancel, remaining_pages, concurrency, move |cancel, idx| {
        let offset = (idx + 1) * page_size;
        let page = fetch(cancel, page_size, offset);
        let collected = Arc::clone(&collected);
        async move {
            let page = page.await?;
            collected
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(page.items);
            Ok(())
        }
    })
    .await?;

    let items = std::mem::take(&mut *items.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(items)
}
