//! Persistence of per-feed head markers.
//!
//! The poller only talks to the [`HeadStore`] trait. Two implementations
//! ship with the crate: [`SqliteStore`] (durable, the default) and
//! [`MemoryStore`] (process-local).

use async_trait::async_trait;

mod heads;
mod memory;
mod schema;
mod types;

pub use memory::MemoryStore;
pub use schema::{SqliteStore, DEFAULT_STORE_PATH};
pub use types::{HeadMarker, StoreError};

/// Key-value store mapping a feed URL to its last-seen [`HeadMarker`].
///
/// `set` must replace the record atomically. Callers serialize writes
/// themselves; implementations only need to be safe for concurrent reads.
#[async_trait]
pub trait HeadStore: Send + Sync {
    /// `Ok(None)` when no marker was ever stored for `url`.
    async fn get(&self, url: &str) -> Result<Option<HeadMarker>, StoreError>;

    async fn set(&self, url: &str, head: &HeadMarker) -> Result<(), StoreError>;

    /// Release the underlying resources. Called once when a run ends.
    async fn close(&self) -> Result<(), StoreError>;
}
