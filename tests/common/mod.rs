//! Shared fakes for the poll-cycle and scheduler integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use feedhook::feed::{FetchError, Fetcher, Item};
use feedhook::storage::{HeadMarker, HeadStore, MemoryStore, StoreError};
use feedhook::{FeedDescriptor, OnNewItem};

pub type Script = Arc<dyn Fn(usize) -> Result<Vec<Item>, FetchError> + Send + Sync>;

pub fn items(titles: &[&str]) -> Vec<Item> {
    titles.iter().map(|t| Item::titled(*t)).collect()
}

pub fn head(title: &str) -> HeadMarker {
    HeadMarker {
        title: Some(title.to_string()),
        ..HeadMarker::default()
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// Fetcher answering from per-URL scripts keyed by call number (0-based).
/// Unknown URLs fail with HTTP 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    calls: Mutex<HashMap<String, usize>>,
    hang: Vec<String>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always return `titles` for `url`.
    pub fn feed(self, url: &str, titles: &[&str]) -> Self {
        let fixed = items(titles);
        self.script(url, move |_| Ok(fixed.clone()))
    }

    pub fn script<F>(mut self, url: &str, f: F) -> Self
    where
        F: Fn(usize) -> Result<Vec<Item>, FetchError> + Send + Sync + 'static,
    {
        self.scripts.insert(url.to_string(), Arc::new(f));
        self
    }

    /// Block until cancelled, like a stuck request that honours cancellation.
    pub fn hanging(mut self, url: &str) -> Self {
        self.hang.push(url.to_string());
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<Item>, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let entry = calls.entry(url.to_string()).or_insert(0);
            *entry += 1;
            *entry - 1
        };

        if self.hang.iter().any(|u| u == url) {
            cancel.cancelled().await;
            return Err(FetchError::Cancelled);
        }

        match self.scripts.get(url) {
            Some(script) => script(call),
            None => Err(FetchError::HttpStatus(404)),
        }
    }
}

// ============================================================================
// Hook
// ============================================================================

/// Records every hook invocation, optionally failing on one title.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<String>>>,
    fail_on: Option<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(title: &str) -> Self {
        Self {
            fail_on: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn hook(&self) -> OnNewItem {
        let seen = Arc::clone(&self.seen);
        let fail_on = self.fail_on.clone();
        Arc::new(move |item: &Item| {
            seen.lock().unwrap().push(item.title.clone());
            if fail_on.as_deref() == Some(item.title.as_str()) {
                anyhow::bail!("hook rejected {}", item.title);
            }
            Ok(())
        })
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

pub fn descriptor(url: &str, hook: OnNewItem, period: Duration) -> FeedDescriptor {
    FeedDescriptor::with_hook(url, hook)
        .unwrap()
        .with_refresh_period(period)
        .unwrap()
}

// ============================================================================
// Store
// ============================================================================

/// Memory store that fails any write started while another is in flight,
/// and counts writes and closes.
#[derive(Default)]
pub struct ExclusiveWriteStore {
    inner: MemoryStore,
    writing: AtomicBool,
    writes: AtomicUsize,
    closes: AtomicUsize,
}

impl ExclusiveWriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeadStore for ExclusiveWriteStore {
    async fn get(&self, url: &str) -> Result<Option<HeadMarker>, StoreError> {
        self.inner.get(url).await
    }

    async fn set(&self, url: &str, head: &HeadMarker) -> Result<(), StoreError> {
        if self.writing.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Backend("re-entrant write".into()));
        }
        // Stay inside the write long enough for other pollers to collide
        tokio::time::sleep(Duration::from_millis(5)).await;
        let result = self.inner.set(url, head).await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.writing.store(false, Ordering::SeqCst);
        result
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close().await
    }
}
