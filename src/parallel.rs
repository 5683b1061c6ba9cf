use std::{
    any::Any,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Runs `f(cancel, index)` for every index in `0..total` with at most `limit`
/// units executing at once.
///
/// The first unit to fail cancels the token handed to every other unit, which
/// stops dispatching and lets in-flight units bail out early. Units that merely
/// report [`Error::Cancelled`] after that are not treated as failures. A panic
/// inside a unit is a failure like any other: it becomes
/// [`Error::Unexpected`] and cancels the siblings right away.
///
/// # Arguments
///
/// * `cancel` - caller's token; a child token is derived and handed to units
/// * `total` - number of units, indexed `0..total`
/// * `limit` - maximum number of units in flight (values below 1 mean 1)
/// * `f` - builds the future for one unit
///
/// # Errors
///
/// Returns once every dispatched unit has finished, with the first genuine
/// error, or [`Error::Cancelled`] if `cancel` itself fired and nothing failed.
///
/// # Example
///
/// ```
/// let cancel = CancellationToken::new();
/// parallel::run_all(&cancel, songs.len(), 6, move |cancel, idx| {
///     let songs = Arc::clone(&songs);
///     async move { resolve(&cancel, &songs[idx]).await }
/// })
/// .await?;
/// ```
pub async fn run_all<F, Fut>(
    cancel: &CancellationToken,
    total: usize,
    limit: usize,
    f: F,
) -> Result<()>
where
    F: Fn(CancellationToken, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let token = cancel.child_token();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let first_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
    let f = Arc::new(f);
    let mut workers = JoinSet::new();

    for idx in 0..total {
        let permit = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let f = Arc::clone(&f);
        let token = token.clone();
        let first_error = Arc::clone(&first_error);
        workers.spawn(async move {
            let _permit = permit;
            if token.is_cancelled() {
                return;
            }

            // the unit runs in its own task so a panic is seen here, while
            // dispatch is still going, and cancels the remaining units
            let unit = tokio::spawn({
                let token = token.clone();
                async move { f(token, idx).await }
            });

            let err = match unit.await {
                Ok(Ok(())) => return,
                Ok(Err(err)) if err.is_cancelled() && token.is_cancelled() => return,
                Ok(Err(err)) => err,
                Err(join) if join.is_panic() => Error::Unexpected(format!(
                    "panic occurred in worker: {}",
                    panic_message(join.into_panic())
                )),
                Err(join) => Error::Unexpected(format!("worker task failed: {join}")),
            };
            record(&first_error, &token, err);
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            record(
                &first_error,
                &token,
                Error::Unexpected(format!("worker task failed: {err}")),
            );
        }
    }

    let first_error = first_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    match first_error {
        Some(err) => Err(err),
        None if cancel.is_cancelled() => Err(Error::Cancelled),
        None => Ok(()),
    }
}

fn record(slot: &Mutex<Option<Error>>, token: &CancellationToken, err: Error) {
    let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_none() {
        *slot = Some(err);
    }
    token.cancel();
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
