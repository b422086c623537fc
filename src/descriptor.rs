//! Static per-feed configuration: what to poll, how often, and what to do
//! with each new item.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::feed::Item;
use crate::util::{validate_feed_url, UrlValidationError};

/// Refresh period used by [`FeedDescriptor::new`].
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// Shortest accepted refresh period.
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Hook invoked once per new item.
///
/// Runs on tokio's blocking pool, one call at a time per feed, so it may
/// block without delaying other feeds. Returning an error aborts
/// the current poll cycle without advancing the head marker, so the item
/// is offered again on the next cycle.
pub type OnNewItem = Arc<dyn Fn(&Item) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid feed URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: UrlValidationError,
    },

    #[error("Refresh period {0:?} is below the minimum of {min:?}", min = MIN_REFRESH_PERIOD)]
    PeriodTooShort(Duration),
}

/// A feed to poll. Immutable once built.
#[derive(Clone)]
pub struct FeedDescriptor {
    url: String,
    refresh_period: Duration,
    on_new_item: OnNewItem,
}

impl FeedDescriptor {
    /// Poll `url` every [`DEFAULT_REFRESH_PERIOD`].
    pub fn new<F>(url: impl Into<String>, on_new_item: F) -> Result<Self, DescriptorError>
    where
        F: Fn(&Item) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_hook(url, Arc::new(on_new_item))
    }

    /// Same as [`FeedDescriptor::new`] for an already shared hook.
    pub fn with_hook(url: impl Into<String>, on_new_item: OnNewItem) -> Result<Self, DescriptorError> {
        let url = url.into();
        if let Err(source) = validate_feed_url(&url) {
            return Err(DescriptorError::InvalidUrl { url, source });
        }
        Ok(Self {
            url,
            refresh_period: DEFAULT_REFRESH_PERIOD,
            on_new_item,
        })
    }

    pub fn with_refresh_period(mut self, period: Duration) -> Result<Self, DescriptorError> {
        if period < MIN_REFRESH_PERIOD {
            return Err(DescriptorError::PeriodTooShort(period));
        }
        self.refresh_period = period;
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    pub(crate) fn notify(&self, item: &Item) -> anyhow::Result<()> {
        (self.on_new_item)(item)
    }
}

impl fmt::Debug for FeedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedDescriptor")
            .field("url", &self.url)
            .field("refresh_period", &self.refresh_period)
            .finish_non_exhaustive()
    }
}

/// Stock hook: logs `"<author>: <link>"` for every new item.
pub fn log_author_and_link(item: &Item) -> anyhow::Result<()> {
    let author = item
        .author
        .as_ref()
        .map(ToString::to_string)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "unknown author".to_string());
    tracing::info!(title = %item.title, "{}: {}", author, item.link.as_deref().unwrap_or(""));
    Ok(())
}
