//! One poll cycle for one feed.
//!
//! A cycle fetches the feed, compares it with the stored head marker, calls
//! the feed's hook for every new item (newest first) and finally advances
//! the marker to the newest fetched item.
//!
//! Items are compared by title only. The scan stops at the first item whose
//! title equals the stored title; if none matches, every fetched item is
//! new. Two distinct items sharing a title are therefore indistinguishable.
//!
//! The marker is written last. A failing hook aborts the cycle before the
//! write, so the same items are offered again next cycle (at-least-once).
//!
//! Hooks are synchronous and may block, so each call runs on tokio's
//! blocking pool; a slow hook stalls only its own feed.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::descriptor::FeedDescriptor;
use crate::error::{StoreOp, TriggerError};
use crate::feed::{Fetcher, Item};
use crate::storage::{HeadMarker, HeadStore};

/// Lock shared by every poller of a run; held only while writing a marker.
pub type WriteLock = Arc<Mutex<()>>;

/// What a successful cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No marker existed yet; the newest item was recorded and no hook ran.
    Bootstrapped,
    /// The hook ran this many times and the marker was advanced.
    Delivered(usize),
    /// The feed had no items; nothing was called or written.
    Empty,
}

pub struct Poller {
    feed: Arc<FeedDescriptor>,
    store: Arc<dyn HeadStore>,
    fetcher: Arc<dyn Fetcher>,
    write_lock: WriteLock,
}

impl Poller {
    pub fn new(
        feed: Arc<FeedDescriptor>,
        store: Arc<dyn HeadStore>,
        fetcher: Arc<dyn Fetcher>,
        write_lock: WriteLock,
    ) -> Self {
        Self {
            feed,
            store,
            fetcher,
            write_lock,
        }
    }

    pub fn feed(&self) -> &FeedDescriptor {
        &self.feed
    }

    /// Run a single cycle.
    ///
    /// # Errors
    ///
    /// - [`TriggerError::Fetch`] if the feed could not be retrieved or parsed
    /// - [`TriggerError::StoreAccess`] if reading or writing the marker failed
    /// - [`TriggerError::Callback`] if the hook failed; the marker is left untouched
    pub async fn poll(&self, cancel: &CancellationToken) -> Result<PollOutcome, TriggerError> {
        let url = self.feed.url();

        let items = self
            .fetcher
            .fetch(url, cancel)
            .await
            .map_err(|source| TriggerError::Fetch {
                url: url.to_owned(),
                source,
            })?;

        let Some(newest) = items.first() else {
            tracing::warn!(feed = %url, "Feed returned no items, keeping previous head");
            return Ok(PollOutcome::Empty);
        };

        let stored = self
            .store
            .get(url)
            .await
            .map_err(|source| TriggerError::StoreAccess {
                url: url.to_owned(),
                op: StoreOp::Get,
                source,
            })?;

        let Some(head) = stored else {
            self.store_head(newest).await?;
            tracing::info!(feed = %url, head = %newest.title, "First poll, recorded feed head");
            return Ok(PollOutcome::Bootstrapped);
        };

        let delivered = self.deliver_new(&items, head.title()).await?;
        self.store_head(newest).await?;

        if delivered > 0 {
            tracing::info!(feed = %url, new_items = delivered, "Delivered new items");
        }
        Ok(PollOutcome::Delivered(delivered))
    }

    /// Call the hook for each item ahead of `seen_title`, in fetch order.
    async fn deliver_new(&self, items: &[Item], seen_title: &str) -> Result<usize, TriggerError> {
        let mut delivered = 0;
        for item in items.iter().take_while(|item| item.title != seen_title) {
            let feed = Arc::clone(&self.feed);
            let owned = item.clone();
            let result = tokio::task::spawn_blocking(move || feed.notify(&owned))
                .await
                .map_err(|_| TriggerError::WorkerPanicked {
                    url: self.feed.url().to_owned(),
                })?;

            result.map_err(|source| TriggerError::Callback {
                url: self.feed.url().to_owned(),
                title: item.title.clone(),
                source,
            })?;
            delivered += 1;
        }
        Ok(delivered)
    }

    async fn store_head(&self, newest: &Item) -> Result<(), TriggerError> {
        let head = HeadMarker::from_item(newest);
        let _guard = self.write_lock.lock().await;
        self.store
            .set(self.feed.url(), &head)
            .await
            .map_err(|source| TriggerError::StoreAccess {
                url: self.feed.url().to_owned(),
                op: StoreOp::Set,
                source,
            })
    }
}
