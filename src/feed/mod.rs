//! Feed retrieval: the item model, the [`Fetcher`] seam, and the default
//! HTTP implementation.
//!
//! - [`item`] - `Item` and `Person`, the transient per-cycle data model
//! - [`parser`] - RSS/Atom parsing using the `feed-rs` crate
//! - [`fetcher`] - the `Fetcher` trait and `HttpFetcher`
//!
//! # Example
//!
//! ```ignore
//! use feedhook::feed::{Fetcher, HttpFetcher};
//! use tokio_util::sync::CancellationToken;
//!
//! let items = HttpFetcher::new()
//!     .fetch("https://example.com/feed.xml", &CancellationToken::new())
//!     .await?;
//! ```

mod fetcher;
mod item;
mod parser;

pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use item::{Item, Person};
pub use parser::parse_feed;
