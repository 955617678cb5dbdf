use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::ContentHash;

use super::types::RenderError;

/// Awaitable outcome of one render episode. Cloning attaches another awaiter.
pub type SharedRender<T> = Shared<BoxFuture<'static, Result<T, RenderError>>>;

struct InFlightRender<T> {
    episode: u64,
    cancel: CancellationToken,
    future: SharedRender<T>,
}

/// Tracks render episodes that are currently running, one per key.
///
/// An episode runs on its own Tokio task, so it keeps going (and fills the
/// cache) even if every awaiter goes away. The entry is removed when the task
/// settles, or straight away when the episode is cancelled.
pub struct InFlightRenders<T> {
    renders: Arc<DashMap<ContentHash, InFlightRender<T>>>,
    next_episode: AtomicU64,
}

impl<T> Default for InFlightRenders<T> {
    fn default() -> Self {
        Self {
            renders: Arc::new(DashMap::new()),
            next_episode: AtomicU64::new(0),
        }
    }
}

impl<T> InFlightRenders<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to the running episode for `key`, or start a new one from
    /// `start`. The boolean is `true` when an existing episode was joined.
    ///
    /// `start` receives the episode's cancellation token; the returned future
    /// is dropped as soon as the token fires. Must be called from within a
    /// Tokio runtime.
    pub fn join<F, Fut>(&self, key: ContentHash, start: F) -> (SharedRender<T>, bool)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, RenderError>> + Send + 'static,
    {
        match self.renders.entry(key) {
            Entry::Occupied(occupied) => (occupied.get().future.clone(), true),
            Entry::Vacant(vacant) => {
                let episode = self.next_episode.fetch_add(1, Ordering::Relaxed);
                let cancel = CancellationToken::new();
                let work = start(cancel.clone());

                let key = vacant.key().clone();
                let renders = Arc::clone(&self.renders);
                let token = cancel.clone();
                let task = tokio::spawn(async move {
                    let outcome = tokio::select! {
                        biased;
                        _ = token.cancelled() => Err(RenderError::Cancelled),
                        outcome = work => outcome,
                    };
                    renders.remove_if(&key, |_, render| render.episode == episode);
                    debug!(episode, key = %key, ok = outcome.is_ok(), "Render episode settled");
                    outcome
                });

                let future = async move {
                    task.await.unwrap_or_else(|err| {
                        Err(RenderError::rendering_failed(format!(
                            "render task failed: {err}"
                        )))
                    })
                }
                .boxed()
                .shared();

                vacant.insert(InFlightRender {
                    episode,
                    cancel,
                    future: future.clone(),
                });
                (future, false)
            }
        }
    }

    /// Cancel the episode for `key`. Its awaiters observe
    /// [`RenderError::Cancelled`]; the next request starts a fresh episode.
    pub fn cancel(&self, key: &ContentHash) -> bool {
        match self.renders.remove(key) {
            Some((_, render)) => {
                render.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every episode and empty the map. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.renders.retain(|_, render| {
            render.cancel.cancel();
            cancelled += 1;
            false
        });
        cancelled
    }

    pub fn len(&self) -> usize {
        self.renders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renders.is_empty()
    }
}
