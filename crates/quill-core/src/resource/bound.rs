//! Bound-resource stream combinator.
//!
//! Turns a (local-query, remote-fetch, persist, gate) tuple into a single
//! ordered stream of [`Resource`] values: the local store's current content
//! is served immediately, a remote refresh runs behind it, and a remote
//! failure degrades to ERROR-tagged local data instead of terminating the
//! stream. Consumers can always render *something*, even with the network
//! down.

use futures::future::Future;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::resource::Resource;

/// Configuration for one [`bound_resource`] invocation, one named field
/// per orchestration stage.
pub struct BoundResource<Q, F, P, G, H> {
    /// Re-subscribable live query against the local store. Must reflect
    /// the store's current state at each invocation, not a cached value.
    pub query_local: Q,
    /// One-shot remote fetch.
    pub fetch_remote: F,
    /// Commits the fetched payload locally; failing here counts as a
    /// fetch failure.
    pub persist: P,
    /// Gate evaluated against the freshest local snapshot.
    pub should_fetch: G,
    /// Side-channel notification invoked when fetch or persist fails.
    pub on_fetch_failed: H,
}

/// Default gate: always fetch.
pub fn always_fetch<T>(_: &T) -> bool {
    true
}

/// Default failure hook: no-op.
pub fn ignore_fetch_failure(_: &Error) {}

/// Run the orchestration described by `config`.
///
/// Emission order is fixed: `loading(None)`, then one local snapshot is
/// read and the gate evaluated. Gate closed: every live local value maps
/// to `success`. Gate open: `loading(stale)` is emitted *before* the fetch
/// future is first polled, fetch and persist run sequentially, and the
/// local query is re-subscribed only after the durability attempt — each
/// value then maps to `success`, or to `error` when fetch/persist failed.
pub fn bound_resource<T, R, Q, S, F, Fut, P, PFut, G, H>(
    config: BoundResource<Q, F, P, G, H>,
) -> impl Stream<Item = Resource<T>> + Send
where
    T: Clone + Send + 'static,
    R: Send + 'static,
    Q: Fn() -> S + Send + 'static,
    S: Stream<Item = T> + Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    P: FnOnce(R) -> PFut + Send + 'static,
    PFut: Future<Output = Result<()>> + Send + 'static,
    G: FnOnce(&T) -> bool + Send + 'static,
    H: FnOnce(&Error) + Send + 'static,
{
    let BoundResource {
        query_local,
        fetch_remote,
        persist,
        should_fetch,
        on_fetch_failed,
    } = config;

    stream::once(async { Resource::loading(None) }).chain(
        stream::once(async move {
            // One snapshot decides the gate; an empty local stream means
            // there is nothing stale to show and the fetch proceeds.
            let stale = Box::pin(query_local()).next().await;

            let wants_fetch = stale.as_ref().map_or(true, |value| should_fetch(value));
            if !wants_fetch {
                return query_local()
                    .map(|value| Resource::success(None, Some(value)))
                    .boxed();
            }

            let head = stream::iter([Resource::loading(stale)]);
            let tail = stream::once(async move {
                let outcome = async { persist(fetch_remote().await?).await }.await;
                match outcome {
                    Ok(()) => query_local()
                        .map(|value| Resource::success(None, Some(value)))
                        .boxed(),
                    Err(error) => {
                        on_fetch_failed(&error);
                        let message = error.to_string();
                        query_local()
                            .map(move |value| Resource::error(message.clone(), None, Some(value)))
                            .boxed()
                    }
                }
            })
            .flatten();

            head.chain(tail).boxed()
        })
        .flatten(),
    )
}
