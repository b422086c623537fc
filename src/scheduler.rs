//! Runs one poller per feed, each on its own timer, and fails the whole run
//! as soon as any poller fails.
//!
//! Every worker polls once immediately so a broken feed surfaces without
//! waiting a full period, then polls again each time its interval fires.
//! The first error cancels the shared token; the remaining workers stop at
//! their next suspension point (an in-flight hook call is never
//! interrupted). [`Scheduler::run`] returns only after every worker has
//! exited, and closes the head store exactly once on the way out.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::descriptor::FeedDescriptor;
use crate::error::TriggerError;
use crate::feed::{Fetcher, HttpFetcher};
use crate::poller::{PollOutcome, Poller, WriteLock};
use crate::storage::{HeadStore, SqliteStore, DEFAULT_STORE_PATH};

/// Live count of running pollers, observable while a run is in progress.
#[derive(Debug, Clone, Default)]
pub struct ActiveWorkers(Arc<AtomicUsize>);

impl ActiveWorkers {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> WorkerGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        WorkerGuard(Arc::clone(&self.0))
    }
}

struct WorkerGuard(Arc<AtomicUsize>);

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Scheduler {
    store: Arc<dyn HeadStore>,
    feeds: Vec<Arc<FeedDescriptor>>,
    fetcher: Arc<dyn Fetcher>,
    write_lock: WriteLock,
    active: ActiveWorkers,
}

impl Scheduler {
    /// Build a scheduler over `feeds`.
    ///
    /// When `store` is `None` the default [`SqliteStore`] at
    /// [`DEFAULT_STORE_PATH`] is opened.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::DuplicateFeed`] if two descriptors share a URL
    /// - [`TriggerError::StoreInit`] if the default store cannot be opened
    pub async fn new(
        store: Option<Arc<dyn HeadStore>>,
        feeds: Vec<FeedDescriptor>,
    ) -> Result<Self, TriggerError> {
        match store {
            Some(store) => {
                ensure_unique(&feeds)?;
                Ok(Self::assemble(store, feeds))
            }
            None => Self::with_store_path(DEFAULT_STORE_PATH, feeds).await,
        }
    }

    /// Build a scheduler over a [`SqliteStore`] opened at `path`.
    ///
    /// Feeds are checked before the database is touched, so a rejected
    /// configuration never creates or locks the file.
    pub async fn with_store_path(
        path: &str,
        feeds: Vec<FeedDescriptor>,
    ) -> Result<Self, TriggerError> {
        ensure_unique(&feeds)?;
        let store = SqliteStore::open(path)
            .await
            .map_err(TriggerError::StoreInit)?;
        Ok(Self::assemble(Arc::new(store), feeds))
    }

    fn assemble(store: Arc<dyn HeadStore>, feeds: Vec<FeedDescriptor>) -> Self {
        Self {
            store,
            feeds: feeds.into_iter().map(Arc::new).collect(),
            fetcher: Arc::new(HttpFetcher::new()),
            write_lock: Arc::new(Mutex::new(())),
            active: ActiveWorkers::default(),
        }
    }

    /// Replace the default [`HttpFetcher`].
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn feeds(&self) -> impl Iterator<Item = &FeedDescriptor> {
        self.feeds.iter().map(|f| f.as_ref())
    }

    pub fn active_workers(&self) -> ActiveWorkers {
        self.active.clone()
    }

    /// Poll every feed until `cancel` fires or a poller fails.
    ///
    /// Returns `Ok(())` after an external cancellation, or the first
    /// poller error otherwise. Dropping the returned future also cancels
    /// all workers.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), TriggerError> {
        let run_token = cancel.child_token();
        let _cancel_on_drop = run_token.clone().drop_guard();

        let mut workers = FuturesUnordered::new();
        for feed in &self.feeds {
            let poller = Poller::new(
                Arc::clone(feed),
                Arc::clone(&self.store),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.write_lock),
            );
            let token = run_token.clone();
            let guard = self.active.enter();
            let handle = tokio::spawn(async move {
                let _guard = guard;
                run_worker(poller, token).await
            });

            let url = feed.url().to_owned();
            workers.push(async move { (url, handle.await) });
        }
        tracing::info!(feeds = self.feeds.len(), "Polling started");

        let mut first_error = None;
        while let Some((url, joined)) = workers.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(TriggerError::WorkerPanicked { url }),
                Err(_) => Ok(()),
            };

            if let Err(e) = result {
                if first_error.is_none() {
                    tracing::error!(error = %e, "Poller failed, stopping all feeds");
                    run_token.cancel();
                    first_error = Some(e);
                } else {
                    tracing::debug!(error = %e, "Additional poller failure after cancellation");
                }
            }
        }

        let closed = self.store.close().await;
        match (first_error, closed) {
            (Some(e), Err(close_err)) => {
                tracing::warn!(error = %close_err, "Failed to close head store");
                Err(e)
            }
            (Some(e), Ok(())) => Err(e),
            (None, Err(close_err)) => Err(TriggerError::StoreClose(close_err)),
            (None, Ok(())) => {
                tracing::info!("Polling stopped");
                Ok(())
            }
        }
    }
}

/// The store is keyed by URL, so each feed may appear only once.
fn ensure_unique(feeds: &[FeedDescriptor]) -> Result<(), TriggerError> {
    let mut seen = HashSet::new();
    for feed in feeds {
        if !seen.insert(feed.url()) {
            return Err(TriggerError::DuplicateFeed {
                url: feed.url().to_owned(),
            });
        }
    }
    Ok(())
}

/// Poll on every tick until cancelled or a cycle fails.
///
/// The interval's first tick completes immediately, which gives the
/// initial fail-early poll.
async fn run_worker(poller: Poller, cancel: CancellationToken) -> Result<(), TriggerError> {
    let url = poller.feed().url().to_owned();
    let mut ticker = tokio::time::interval(poller.feed().refresh_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match poller.poll(&cancel).await {
            Ok(PollOutcome::Delivered(0)) | Ok(PollOutcome::Empty) => {
                tracing::debug!(feed = %url, "No new items");
            }
            Ok(outcome) => {
                tracing::debug!(feed = %url, ?outcome, "Poll cycle complete");
            }
            // Only a cancellation the run asked for is a clean exit
            Err(e) if e.is_cancelled() && cancel.is_cancelled() => break,
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(feed = %url, "Poller stopped");
    Ok(())
}
