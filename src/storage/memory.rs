use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::types::{HeadMarker, StoreError};
use super::HeadStore;

/// Process-local head store. Markers are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    heads: RwLock<HashMap<String, HeadMarker>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HeadStore for MemoryStore {
    async fn get(&self, url: &str) -> Result<Option<HeadMarker>, StoreError> {
        self.ensure_open()?;
        Ok(self.heads.read().await.get(url).cloned())
    }

    async fn set(&self, url: &str, head: &HeadMarker) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.heads
            .write()
            .await
            .insert(url.to_owned(), head.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
