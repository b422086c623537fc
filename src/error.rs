use std::fmt;
use thiserror::Error;

use crate::feed::FetchError;
use crate::storage::StoreError;

/// Store operation that failed during a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Set,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOp::Get => f.write_str("reading head marker"),
            StoreOp::Set => f.write_str("storing head marker"),
        }
    }
}

/// Terminal error of a scheduler run.
///
/// Every variant except `StoreInit` and `StoreClose` names the feed it
/// came from. Any of them ends the whole run.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The default head store could not be opened
    #[error("Failed to open head store: {0}")]
    StoreInit(#[source] StoreError),

    #[error("Fetching feed {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("{op} for {url}: {source}")]
    StoreAccess {
        url: String,
        op: StoreOp,
        #[source]
        source: StoreError,
    },

    /// The new-item hook returned an error; the head marker was not advanced
    #[error("New item hook failed for {url} on {title:?}: {source}")]
    Callback {
        url: String,
        title: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to close head store: {0}")]
    StoreClose(#[source] StoreError),

    #[error("Poller for {url} panicked")]
    WorkerPanicked { url: String },

    #[error("Feed {url} is configured more than once")]
    DuplicateFeed { url: String },
}

impl TriggerError {
    /// Feed the error originated from, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            TriggerError::Fetch { url, .. }
            | TriggerError::StoreAccess { url, .. }
            | TriggerError::Callback { url, .. }
            | TriggerError::WorkerPanicked { url }
            | TriggerError::DuplicateFeed { url } => Some(url.as_str()),
            TriggerError::StoreInit(_) | TriggerError::StoreClose(_) => None,
        }
    }

    /// True when a fetch gave up because the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TriggerError::Fetch {
                source: FetchError::Cancelled,
                ..
            }
        )
    }
}
