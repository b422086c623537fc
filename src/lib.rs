//! Poll RSS/Atom feeds on independent schedules and run a hook for every
//! item that appeared since the last successful poll.
//!
//! ```ignore
//! use feedhook::{log_author_and_link, FeedDescriptor, Scheduler};
//! use tokio_util::sync::CancellationToken;
//!
//! let feeds = vec![FeedDescriptor::new(
//!     "https://github.com/rust-lang/rust/commits/master.atom",
//!     log_author_and_link,
//! )?];
//! let scheduler = Scheduler::new(None, feeds).await?;
//! scheduler.run(CancellationToken::new()).await?;
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod feed;
pub mod poller;
pub mod scheduler;
pub mod storage;
pub mod util;

pub use descriptor::{log_author_and_link, FeedDescriptor, OnNewItem};
pub use error::TriggerError;
pub use scheduler::Scheduler;
